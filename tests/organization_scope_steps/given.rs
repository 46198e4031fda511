//! Given steps for organization scope BDD scenarios.

use super::world::{OrganizationScopeWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use taskboard::organization::services::CreateOrganizationRequest;

#[given(r#"a root organization "{name}""#)]
fn root_organization(world: &mut OrganizationScopeWorld, name: String) -> Result<(), eyre::Report> {
    let created = run_async(
        world
            .service
            .create(CreateOrganizationRequest::new(name.clone())),
    )
    .wrap_err("create root organization for scenario")?;
    world.organization_ids.insert(name, created.id());
    Ok(())
}

#[given(r#"an organization "{name}" under "{parent}""#)]
fn child_organization(
    world: &mut OrganizationScopeWorld,
    name: String,
    parent: String,
) -> Result<(), eyre::Report> {
    let parent_id = world.organization(&parent)?;
    let created = run_async(
        world
            .service
            .create(CreateOrganizationRequest::new(name.clone()).with_parent(parent_id)),
    )
    .wrap_err("create child organization for scenario")?;
    world.organization_ids.insert(name, created.id());
    Ok(())
}
