//! Then steps for organization scope BDD scenarios.

use super::world::{OrganizationScopeWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::then;
use taskboard::organization::{domain::OrganizationDomainError, services::OrganizationServiceError};

fn last_access(world: &OrganizationScopeWorld) -> Result<bool, eyre::Report> {
    world
        .last_access
        .ok_or_else(|| eyre::eyre!("missing access decision"))
}

#[then("access is granted")]
fn access_is_granted(world: &OrganizationScopeWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(last_access(world)?, "expected access to be granted");
    Ok(())
}

#[then("access is denied")]
fn access_is_denied(world: &OrganizationScopeWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(!last_access(world)?, "expected access to be denied");
    Ok(())
}

#[then("the update fails with an invalid hierarchy error")]
fn update_fails_with_invalid_hierarchy(world: &OrganizationScopeWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_update
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing update result"))?;
    if !matches!(
        result,
        Err(OrganizationServiceError::Domain(
            OrganizationDomainError::InvalidHierarchy(_)
        ))
    ) {
        return Err(eyre::eyre!("expected InvalidHierarchy error, got {result:?}"));
    }
    Ok(())
}

#[then(r#""{name}" is still a root organization"#)]
fn still_root(world: &OrganizationScopeWorld, name: String) -> Result<(), eyre::Report> {
    let id = world.organization(&name)?;
    let stored = run_async(world.service.find(id)).wrap_err("reload organization")?;
    eyre::ensure!(
        stored.parent_id().is_none(),
        "expected {name} to remain a root organization"
    );
    Ok(())
}
