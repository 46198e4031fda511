//! Given steps for task ordering BDD scenarios.

use super::world::{TaskBoardWorld, run_async, status, titles};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use taskboard::{
    access::domain::{Caller, Role},
    organization::services::CreateOrganizationRequest,
    task::services::CreateTaskRequest,
    user::domain::UserId,
};

#[given(r#"a root organization "{name}" with an admin"#)]
fn root_organization_with_admin(
    world: &mut TaskBoardWorld,
    name: String,
) -> Result<(), eyre::Report> {
    let organization = run_async(
        world
            .organizations
            .create(CreateOrganizationRequest::new(name.clone())),
    )
    .wrap_err("create organization for scenario")?;
    world.admin = Some(Caller::new(UserId::new(), Role::Admin, organization.id()));
    world.organization_ids.insert(name, organization.id());
    Ok(())
}

#[given(r#"the admin created tasks "{list}" in "{column}""#)]
fn admin_created_tasks(
    world: &mut TaskBoardWorld,
    list: String,
    column: String,
) -> Result<(), eyre::Report> {
    let admin = world.admin()?;
    let target = status(&column)?;
    for title in titles(&list) {
        let task = run_async(
            world
                .board
                .create_task(&admin, CreateTaskRequest::new(title.clone()).with_status(target)),
        )
        .wrap_err_with(|| format!("create task {title:?} for scenario"))?;
        world.task_ids.insert(title, task.id());
    }
    Ok(())
}
