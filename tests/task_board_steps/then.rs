//! Then steps for task ordering BDD scenarios.

use super::world::{TaskBoardWorld, run_async, status, titles};
use eyre::WrapErr;
use rstest_bdd_macros::then;
use taskboard::{access::domain::Role, task::services::TaskBoardError};

#[then(r#"the "{column}" column of "{organization}" is "{list}""#)]
fn column_is(
    world: &TaskBoardWorld,
    column: String,
    organization: String,
    list: String,
) -> Result<(), eyre::Report> {
    let owner = world.caller(Role::Owner, &organization)?;
    let tasks = run_async(world.board.list_column(
        &owner,
        owner.organization_id(),
        status(&column)?,
    ))
    .wrap_err("list column in scenario")?;

    for (expected, task) in (0_u32..).zip(&tasks) {
        if task.order_index().value() != expected {
            return Err(eyre::eyre!(
                "column {column} is not dense: {} sits at {}",
                task.title(),
                task.order_index()
            ));
        }
    }
    let actual: Vec<String> = tasks
        .iter()
        .map(|task| task.title().as_str().to_owned())
        .collect();
    let expected = titles(&list);
    if actual != expected {
        return Err(eyre::eyre!(
            "expected column {column} to be {expected:?}, found {actual:?}"
        ));
    }
    Ok(())
}

#[then("the request is forbidden")]
fn request_is_forbidden(world: &TaskBoardWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing request result"))?;
    if !matches!(result, Err(TaskBoardError::Forbidden { .. })) {
        return Err(eyre::eyre!("expected Forbidden error, got {result:?}"));
    }
    Ok(())
}
