//! When steps for organization scope BDD scenarios.

use super::world::{OrganizationScopeWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use taskboard::{
    access::domain::{Caller, Role},
    organization::services::{ParentChange, UpdateOrganizationRequest},
    user::domain::UserId,
};

fn ask_for_access(
    world: &mut OrganizationScopeWorld,
    role: Role,
    caller_org: &str,
    target: &str,
) -> Result<(), eyre::Report> {
    let caller = Caller::new(UserId::new(), role, world.organization(caller_org)?);
    let target_id = world.organization(target)?;
    let granted = run_async(world.service.check_org_access(&caller, target_id))
        .wrap_err("evaluate organization access")?;
    world.last_access = Some(granted);
    Ok(())
}

#[when(r#"an admin of "{caller_org}" asks for access to "{target}""#)]
fn admin_asks_for_access(
    world: &mut OrganizationScopeWorld,
    caller_org: String,
    target: String,
) -> Result<(), eyre::Report> {
    ask_for_access(world, Role::Admin, &caller_org, &target)
}

#[when(r#"a viewer of "{caller_org}" asks for access to "{target}""#)]
fn viewer_asks_for_access(
    world: &mut OrganizationScopeWorld,
    caller_org: String,
    target: String,
) -> Result<(), eyre::Report> {
    ask_for_access(world, Role::Viewer, &caller_org, &target)
}

#[when(r#""{name}" is moved under "{parent}""#)]
fn organization_is_moved(
    world: &mut OrganizationScopeWorld,
    name: String,
    parent: String,
) -> Result<(), eyre::Report> {
    let id = world.organization(&name)?;
    let parent_id = world.organization(&parent)?;
    let request = UpdateOrganizationRequest::new().with_parent(ParentChange::AttachTo(parent_id));
    world.last_update = Some(run_async(world.service.update(id, request)));
    Ok(())
}
