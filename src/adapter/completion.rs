use std::{fmt, sync::Arc};

use crate::{
    adapter::FailurePayload,
    dispatch::{Settlement, Trigger},
    error::DispatchError,
    response::{self, AdapterResponse},
};

/// The slot through which an adapter reports the outcome of a request.
///
/// Both [`success`](Completion::success) and [`fail`](Completion::fail)
/// consume the completion, so at most one outcome can be reported. Dropping
/// it without reporting fails the request.
pub struct Completion {
    settlement: Option<Arc<Settlement>>,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl Completion {
    pub(crate) fn new(settlement: Arc<Settlement>) -> Self {
        Self {
            settlement: Some(settlement),
        }
    }

    /// Returns `true` if the request has already been settled, for example
    /// because the caller cancelled it.
    ///
    /// Adapters may use this to skip work whose outcome would be ignored.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settlement
            .as_ref()
            .is_none_or(|settlement| settlement.is_settled())
    }

    /// Reports a response from the transport.
    ///
    /// The response is checked against the request's status validator and
    /// the request fails with [`DispatchError::BadStatus`] if it is rejected.
    pub fn success(mut self, response: AdapterResponse) {
        let Some(settlement) = self.settlement.take() else {
            return;
        };

        let config = settlement.config().clone();
        let response = response::normalize(response, config.clone());
        let accepted = config
            .validate_status
            .as_ref()
            .is_none_or(|validate| validate.accepts(response.status));

        let outcome = if accepted {
            Ok(response)
        } else {
            let status = response.status;
            let message = config.messages.render_bad_status(status);
            Err(DispatchError::BadStatus {
                status,
                source: settlement.request_error(message, Some(response)),
            })
        };

        settlement.settle(outcome, Trigger::Success);
    }

    /// Reports a transport failure.
    pub fn fail(mut self, failure: impl Into<FailurePayload>) {
        let Some(settlement) = self.settlement.take() else {
            return;
        };

        let message = failure.into().into_message();
        let error = DispatchError::Transport {
            source: settlement.request_error(message, None),
        };
        settlement.settle(Err(error), Trigger::Fail);
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        let Some(settlement) = self.settlement.take() else {
            return;
        };

        let message = settlement.config().messages.adapter_dropped.to_string();
        let error = DispatchError::Transport {
            source: settlement.request_error(message, None),
        };
        settlement.settle(Err(error), Trigger::Dropped);
    }
}
