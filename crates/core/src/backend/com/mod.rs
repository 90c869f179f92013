//! COM backend
//!
//! Hosts register their automation object in the Running Object Table under
//! `!VisualStudio.DTE.<version>:<pid>`. Everything here runs on one
//! single-threaded apartment, initialized when the backend is created.

mod dispatch;
mod dte;
mod message_filter;
mod rot;

use super::Backend;
use crate::error::{Error, Result};
use std::rc::Rc;
use tracing::{debug, warn};
use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::System::Com::{COINIT_APARTMENTTHREADED, CoInitializeEx, CoUninitialize};

/// COM initialization of the current thread, undone on drop
pub(super) struct Apartment {
    initialized: bool,
}

impl Apartment {
    fn enter() -> Result<Rc<Self>> {
        let hr = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };
        if hr == RPC_E_CHANGED_MODE {
            // the thread is already in another apartment; keep it
            warn!("COM already initialized with a different threading model");
            return Ok(Rc::new(Self { initialized: false }));
        }
        hr.ok()
            .map_err(|e| Error::Host(format!("COM initialization failed: {}", e.message())))?;
        debug!("Entered single-threaded apartment");
        Ok(Rc::new(Self { initialized: true }))
    }
}

impl Drop for Apartment {
    fn drop(&mut self) {
        if self.initialized {
            unsafe { CoUninitialize() };
        }
    }
}

pub(super) fn backend() -> Result<Backend> {
    let apartment = Apartment::enter()?;
    Ok(Backend::new(
        Box::new(rot::RunningObjectTable::new(Rc::clone(&apartment))),
        Box::new(rot::ForegroundWindow),
        std::sync::Arc::new(message_filter::ComFilterRegistrar::new(apartment)),
    ))
}
