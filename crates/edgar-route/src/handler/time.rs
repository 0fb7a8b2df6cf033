//! Time and date handler.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};

use crate::error::RouteError;
use crate::handler::RouteHandler;
use crate::types::HandlerReply;

/// Answers questions about the current local time or date.
pub struct TimeHandler;

impl TimeHandler {
    /// Phrase the answer for `input` at the given moment.
    pub fn reply_at(input: &str, now: NaiveDateTime) -> String {
        let lower = input.to_lowercase();
        if lower.contains("time") {
            format!("The current time is {}.", now.format("%I:%M %p"))
        } else if lower.contains("date") || lower.contains("day") {
            format!("Today's date is {}.", now.format("%B %d, %Y"))
        } else {
            format!(
                "The current date and time is {}.",
                now.format("%B %d, %Y at %I:%M %p")
            )
        }
    }
}

#[async_trait]
impl RouteHandler for TimeHandler {
    fn name(&self) -> &str {
        "time"
    }

    fn describe(&self) -> &str {
        "Current local time and date"
    }

    async fn invoke(&self, input: &str) -> Result<Vec<HandlerReply>, RouteError> {
        let text = Self::reply_at(input, Local::now().naive_local());
        tracing::debug!(reply = %text, "Time handler answered");
        Ok(vec![HandlerReply::new(text, 1.0, self.name())])
    }
}
