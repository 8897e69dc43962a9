//! Destinations for streamed measure rows.

use crate::error::{MeasureError, MeasureResult};
use crate::model::MeasureFact;

/// Where the rows of one resolved filter go.
pub(crate) enum Sink<'a> {
    /// Buffer every row.
    Collect(Vec<MeasureFact>),
    /// Hand each row to a caller callback.
    Forward(&'a mut dyn FnMut(MeasureFact) -> MeasureResult<()>),
    /// Keep the only row; a second row aborts the stream.
    AtMostOne(Option<MeasureFact>),
}

impl<'a> Sink<'a> {
    pub(crate) fn collect() -> Self {
        Sink::Collect(Vec::new())
    }

    pub(crate) fn at_most_one() -> Self {
        Sink::AtMostOne(None)
    }

    pub(crate) fn forward(handler: &'a mut dyn FnMut(MeasureFact) -> MeasureResult<()>) -> Self {
        Sink::Forward(handler)
    }

    pub(crate) fn accept(&mut self, fact: MeasureFact) -> MeasureResult<()> {
        match self {
            Sink::Collect(rows) => {
                rows.push(fact);
                Ok(())
            }
            Sink::Forward(handler) => handler(fact),
            Sink::AtMostOne(slot) => {
                if slot.is_some() {
                    // the stream stops here, so two is all that is known
                    return Err(MeasureError::TooManyResults { count: 2 });
                }
                *slot = Some(fact);
                Ok(())
            }
        }
    }

    /// Rows buffered so far. Forwarding sinks hold none.
    pub(crate) fn into_rows(self) -> Vec<MeasureFact> {
        match self {
            Sink::Collect(rows) => rows,
            Sink::AtMostOne(slot) => slot.into_iter().collect(),
            Sink::Forward(_) => Vec::new(),
        }
    }
}
