//! Wait gate
//!
//! Runs between navigation and extraction on the non-redirect path only.

use crate::config::{WaitCondition, WaitFor};
use crate::driver::PageDriver;
use crate::SumiError;
use std::time::Duration;

/// Blocks until the configured wait condition is met
///
/// Without a condition this returns immediately. A fixed timeout is slept
/// on the host; selector and function waits are delegated to the driver,
/// which enforces their own timeouts.
pub async fn wait_gate<D>(driver: &D, wait_for: Option<&WaitFor>) -> Result<(), SumiError>
where
    D: PageDriver + ?Sized,
{
    let Some(wait_for) = wait_for else {
        return Ok(());
    };

    let outcome = match &wait_for.condition {
        WaitCondition::Selector(selector) => {
            tracing::debug!("Waiting for selector {}", selector);
            driver.wait_for_selector(selector, &wait_for.options).await
        }
        WaitCondition::Function(function) => {
            tracing::debug!("Waiting for predicate ({} args)", wait_for.args.len());
            driver
                .wait_for_function(function, &wait_for.options, &wait_for.args)
                .await
        }
        WaitCondition::Timeout(millis) => {
            tracing::debug!("Waiting {}ms", millis);
            tokio::time::sleep(Duration::from_millis(*millis)).await;
            Ok(())
        }
    };

    outcome.map_err(SumiError::WaitGate)
}
