use super::Apartment;
use super::dispatch::Dispatch;
use super::dte::ComApp;
use crate::interfaces::{HostApp, HostError, HostResult, LiveObject, ObjectRegistry, WindowFocus};
use std::rc::Rc;
use windows::Win32::Foundation::S_OK;
use windows::Win32::System::Com::{
    CoTaskMemFree, CreateBindCtx, GetRunningObjectTable, IBindCtx, IDispatch, IMoniker,
    IRunningObjectTable,
};
use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId};
use windows::core::Interface;

fn com_error(what: &str, error: windows::core::Error) -> HostError {
    HostError::Unavailable(format!("{what} ({})", error.message()))
}

pub(super) struct RunningObjectTable {
    apartment: Rc<Apartment>,
}

impl RunningObjectTable {
    pub(super) fn new(apartment: Rc<Apartment>) -> Self {
        Self { apartment }
    }
}

impl ObjectRegistry for RunningObjectTable {
    fn enumerate(&self) -> HostResult<Vec<Box<dyn LiveObject>>> {
        let table = unsafe { GetRunningObjectTable(0) }
            .map_err(|e| com_error("Running Object Table", e))?;
        let monikers = unsafe { table.EnumRunning() }
            .map_err(|e| com_error("Running Object Table", e))?;

        let mut entries: Vec<Box<dyn LiveObject>> = Vec::new();
        let mut slot = [None];
        while unsafe { monikers.Next(&mut slot, None) } == S_OK {
            if let Some(moniker) = slot[0].take() {
                entries.push(Box::new(RotEntry {
                    table: table.clone(),
                    moniker,
                    apartment: Rc::clone(&self.apartment),
                }));
            }
        }
        Ok(entries)
    }
}

struct RotEntry {
    table: IRunningObjectTable,
    moniker: IMoniker,
    apartment: Rc<Apartment>,
}

impl LiveObject for RotEntry {
    fn display_name(&self) -> HostResult<String> {
        let context: IBindCtx =
            unsafe { CreateBindCtx(0) }.map_err(|e| com_error("bind context", e))?;
        let name = unsafe { self.moniker.GetDisplayName(&context, None) }
            .map_err(|e| com_error("moniker name", e))?;
        let text = unsafe { name.to_string() };
        unsafe { CoTaskMemFree(Some(name.0 as *const _)) };
        text.map_err(|e| HostError::Failed(format!("moniker name is not UTF-16: {e}")))
    }

    fn bind(&self) -> HostResult<Box<dyn HostApp>> {
        let unknown = unsafe { self.table.GetObject(&self.moniker) }
            .map_err(|e| com_error("registered object", e))?;
        let object = unknown
            .cast::<IDispatch>()
            .map_err(|e| com_error("automation interface", e))?;
        Ok(Box::new(ComApp::new(Dispatch::new(
            object,
            Rc::clone(&self.apartment),
        ))))
    }
}

pub(super) struct ForegroundWindow;

impl WindowFocus for ForegroundWindow {
    fn foreground_process_id(&self) -> Option<u32> {
        let window = unsafe { GetForegroundWindow() };
        if window.0.is_null() {
            return None;
        }
        let mut process_id = 0u32;
        unsafe { GetWindowThreadProcessId(window, Some(&mut process_id)) };
        (process_id != 0).then_some(process_id)
    }
}
