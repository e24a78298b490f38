//! Class Schedule suite

use futures::future::BoxFuture;

use crate::dates;
use crate::driver::Driver;
use crate::error::{WorkflowError, WorkflowResult};
use crate::expect::ensure_eq;
use crate::fixtures::{EventRecord, EventUpdate, schedule};
use crate::pages::{Workflow, create_and_verify};
use crate::scenario::{Scenario, ScenarioContext};

pub const SUITE: &str = "Schedule Management";

pub fn suite<D: Driver>() -> Vec<Scenario<D>> {
    vec![
        Scenario {
            id: "TC-SCHED-01",
            title: "Verify page title is displayed correctly",
            suite: SUITE,
            run: page_title,
        },
        Scenario {
            id: "TC-SCHED-02",
            title: "Verify today's date is displayed correctly",
            suite: SUITE,
            run: todays_date,
        },
        Scenario {
            id: "TC-SCHED-03",
            title: "Create an event for today",
            suite: SUITE,
            run: create_event,
        },
        Scenario {
            id: "TC-SCHED-04",
            title: "Verify newly added event is visible",
            suite: SUITE,
            run: new_event_visible,
        },
        Scenario {
            id: "TC-SCHED-05",
            title: "Edit an existing event",
            suite: SUITE,
            run: edit_event,
        },
        Scenario {
            id: "TC-SCHED-06",
            title: "Verify edited event shows updated information",
            suite: SUITE,
            run: edited_event_details,
        },
        Scenario {
            id: "TC-SCHED-07",
            title: "Calendar month navigation returns to the current month",
            suite: SUITE,
            run: month_navigation,
        },
    ]
}

fn new_event(index: usize) -> WorkflowResult<&'static EventRecord> {
    schedule()
        .new_events
        .get(index)
        .ok_or_else(|| WorkflowError::DataShape(format!("no new event at index {index}")))
}

fn event_update(index: usize) -> WorkflowResult<&'static EventUpdate> {
    schedule()
        .event_updates
        .get(index)
        .ok_or_else(|| WorkflowError::DataShape(format!("no event update at index {index}")))
}

fn page_title<D: Driver>(ctx: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
    Box::pin(async move {
        let page = ctx.schedule();
        page.navigate().await?;
        page.verify_page_title().await?;
        page.verify_subtitle().await
    })
}

fn todays_date<D: Driver>(ctx: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
    Box::pin(async move {
        let page = ctx.schedule();
        page.navigate().await?;
        page.click_today().await?;
        page.verify_todays_date().await?;
        let header = page.schedule_header_text().await?;
        let expected = dates::format_long_date(page.today());
        tracing::info!(%expected, actual = %header, "schedule header");
        ensure_eq(
            "header names today",
            true,
            dates::header_contains_date(&header, page.today()),
        )
    })
}

fn create_event<D: Driver>(ctx: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
    Box::pin(async move {
        let event = new_event(0)?;
        let page = ctx.schedule();
        page.navigate().await?;
        page.click_today().await?;
        create_and_verify(&page, event, &event.title).await
    })
}

fn new_event_visible<D: Driver>(ctx: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
    Box::pin(async move {
        let event = new_event(1)?;
        let page = ctx.schedule();
        page.navigate().await?;
        page.click_today().await?;
        create_and_verify(&page, event, &event.title).await?;
        if let Some(location) = &event.location {
            page.verify_event_card_contains(&event.title, location).await?;
        }
        Ok(())
    })
}

fn edit_event<D: Driver>(ctx: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
    Box::pin(async move {
        let original = new_event(2)?;
        let update = event_update(0)?;
        let page = ctx.schedule();
        page.navigate().await?;
        page.click_today().await?;
        page.fill_and_submit(original).await?;
        page.update_event(&original.title, &update.new_data).await?;
        page.session().settle_refresh().await;
        let edited = update.new_data.apply_to(original);
        page.verify_event_present(&edited.title).await
    })
}

fn edited_event_details<D: Driver>(
    ctx: &ScenarioContext<D>,
) -> BoxFuture<'_, WorkflowResult<()>> {
    Box::pin(async move {
        let original = new_event(3)?;
        let update = event_update(1)?;
        let page = ctx.schedule();
        page.navigate().await?;
        page.click_today().await?;
        page.fill_and_submit(original).await?;
        page.update_event(&original.title, &update.new_data).await?;
        page.session().settle_refresh().await;
        // The delta carries no title, so the card keeps the original one
        let edited = update.new_data.apply_to(original);
        let location = edited.location.as_deref().unwrap_or_default();
        page.verify_event_card_contains(&edited.title, location).await
    })
}

fn month_navigation<D: Driver>(ctx: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
    Box::pin(async move {
        let page = ctx.schedule();
        page.navigate().await?;
        let current = page.month_year().await?;
        ensure_eq(
            "calendar caption",
            dates::month_year_label(page.today()),
            current.clone(),
        )?;
        page.next_month().await?;
        let next = page.month_year().await?;
        if next == current {
            return Err(WorkflowError::assertion(
                "caption after next month",
                format!("anything but {current:?}"),
                next,
            ));
        }
        page.previous_month().await?;
        ensure_eq("caption after returning", current, page.month_year().await?)
    })
}
