//! When steps for task ordering BDD scenarios.

use super::world::{TaskBoardWorld, run_async, status, titles};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use taskboard::{
    access::domain::Role,
    task::services::{CreateTaskRequest, ReorderTaskRequest},
};

#[when(r#"the admin creates tasks "{list}" in "{column}""#)]
fn admin_creates_tasks(
    world: &mut TaskBoardWorld,
    list: String,
    column: String,
) -> Result<(), eyre::Report> {
    let admin = world.admin()?;
    let target = status(&column)?;
    for title in titles(&list) {
        let result = run_async(
            world
                .board
                .create_task(&admin, CreateTaskRequest::new(title.clone()).with_status(target)),
        );
        if let Ok(ref task) = result {
            world.task_ids.insert(title, task.id());
        }
        world.last_result = Some(result);
    }
    Ok(())
}

#[when(r#"the admin deletes task "{title}""#)]
fn admin_deletes_task(world: &mut TaskBoardWorld, title: String) -> Result<(), eyre::Report> {
    let admin = world.admin()?;
    let id = world.task(&title)?;
    run_async(world.board.delete_task(&admin, id)).wrap_err("delete task in scenario")?;
    world.task_ids.remove(&title);
    Ok(())
}

#[when(r#"the admin moves task "{title}" to index {index:u32} of "{column}""#)]
fn admin_moves_task_across(
    world: &mut TaskBoardWorld,
    title: String,
    index: u32,
    column: String,
) -> Result<(), eyre::Report> {
    let admin = world.admin()?;
    let id = world.task(&title)?;
    let request = ReorderTaskRequest::new(index).to_status(status(&column)?);
    world.last_result = Some(run_async(world.board.reorder_task(&admin, id, request)));
    Ok(())
}

#[when(r#"the admin moves task "{title}" to index {index:u32} of its column"#)]
fn admin_moves_task_within(
    world: &mut TaskBoardWorld,
    title: String,
    index: u32,
) -> Result<(), eyre::Report> {
    let admin = world.admin()?;
    let id = world.task(&title)?;
    world.last_result = Some(run_async(world.board.reorder_task(
        &admin,
        id,
        ReorderTaskRequest::new(index),
    )));
    Ok(())
}

#[when(r#"a viewer of "{organization}" moves task "{title}" to index {index:u32} of its column"#)]
fn viewer_moves_task(
    world: &mut TaskBoardWorld,
    organization: String,
    title: String,
    index: u32,
) -> Result<(), eyre::Report> {
    let viewer = world.caller(Role::Viewer, &organization)?;
    let id = world.task(&title)?;
    world.last_result = Some(run_async(world.board.reorder_task(
        &viewer,
        id,
        ReorderTaskRequest::new(index),
    )));
    Ok(())
}
