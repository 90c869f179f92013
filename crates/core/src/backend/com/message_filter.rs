//! `IMessageFilter` over [`RetryFilter`]

use super::Apartment;
use crate::filter::{IncomingCall, PendingAction, RejectKind, RetryDecision, RetryFilter};
use crate::interfaces::{FilterRegistrar, HostError, HostResult};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use windows::Win32::System::Com::{CoRegisterMessageFilter, HTASK, IMessageFilter, IMessageFilter_Impl, INTERFACEINFO};
use windows::core::implement;

const SERVERCALL_ISHANDLED: u32 = 0;
const SERVERCALL_RETRYLATER: u32 = 2;
const PENDINGMSG_WAITDEFPROCESS: u32 = 2;
/// Returned from `RetryRejectedCall` to cancel the call
const CANCEL_CALL: u32 = u32::MAX;

#[implement(IMessageFilter)]
struct ComMessageFilter {
    filter: Arc<RetryFilter>,
}

impl IMessageFilter_Impl for ComMessageFilter_Impl {
    fn HandleInComingCall(
        &self,
        _call_type: u32,
        _caller: HTASK,
        _tick_count: u32,
        _interface: *const INTERFACEINFO,
    ) -> u32 {
        match self.filter.on_incoming_call() {
            IncomingCall::Handled => SERVERCALL_ISHANDLED,
        }
    }

    fn RetryRejectedCall(&self, _callee: HTASK, elapsed_ms: u32, reject_type: u32) -> u32 {
        let kind = if reject_type == SERVERCALL_RETRYLATER {
            RejectKind::RetryLater
        } else {
            RejectKind::Rejected
        };
        match self
            .filter
            .on_call_rejected(Duration::from_millis(u64::from(elapsed_ms)), kind)
        {
            RetryDecision::RetryAfter(delay) => {
                debug!("Host busy after {}ms, retrying in {:?}", elapsed_ms, delay);
                u32::try_from(delay.as_millis()).unwrap_or(CANCEL_CALL - 1)
            }
            RetryDecision::Cancel => CANCEL_CALL,
        }
    }

    fn MessagePending(&self, _callee: HTASK, _tick_count: u32, _pending_type: u32) -> u32 {
        match self.filter.on_message_pending() {
            PendingAction::ProcessMessages => PENDINGMSG_WAITDEFPROCESS,
        }
    }
}

/// Registers the process message filter, restoring the previous one on revoke
pub(super) struct ComFilterRegistrar {
    previous: RefCell<Option<IMessageFilter>>,
    _apartment: Rc<Apartment>,
}

impl ComFilterRegistrar {
    pub(super) fn new(apartment: Rc<Apartment>) -> Self {
        Self {
            previous: RefCell::new(None),
            _apartment: apartment,
        }
    }
}

impl FilterRegistrar for ComFilterRegistrar {
    fn install(&self, filter: Arc<RetryFilter>) -> HostResult<()> {
        let filter: IMessageFilter = ComMessageFilter { filter }.into();
        let mut previous = None;
        unsafe { CoRegisterMessageFilter(&filter, Some(&mut previous)) }
            .map_err(|e| HostError::Failed(format!("CoRegisterMessageFilter: {}", e.message())))?;
        *self.previous.borrow_mut() = previous;
        Ok(())
    }

    fn revoke(&self) -> HostResult<()> {
        let previous = self.previous.borrow_mut().take();
        unsafe { CoRegisterMessageFilter(previous.as_ref(), None) }
            .map_err(|e| HostError::Failed(format!("CoRegisterMessageFilter: {}", e.message())))
    }
}
