//! Late-bound `IDispatch` calls
//!
//! Members are looked up by name on every call. Failures are mapped onto
//! [`HostError`]: call rejections become `Busy`, missing members and
//! disconnected objects become `Unavailable`, and automation exceptions keep
//! the host's own description.

use super::Apartment;
use crate::interfaces::{HostError, HostResult};
use std::mem::ManuallyDrop;
use std::rc::Rc;
use windows::Win32::Foundation::{
    DISP_E_EXCEPTION, DISP_E_MEMBERNOTFOUND, DISP_E_UNKNOWNNAME, RPC_E_CALL_REJECTED,
    RPC_E_DISCONNECTED, RPC_E_SERVERCALL_RETRYLATER,
};
use windows::Win32::System::Com::{
    DISPATCH_FLAGS, DISPATCH_METHOD, DISPATCH_PROPERTYGET, DISPATCH_PROPERTYPUT, DISPPARAMS,
    EXCEPINFO, IDispatch,
};
use windows::core::{BSTR, GUID, HSTRING, IUnknown, Interface, PCWSTR, VARIANT};

const DISPID_PROPERTYPUT: i32 = -3;

/// An automation object and the apartment it lives in
#[derive(Clone)]
pub(super) struct Dispatch {
    object: IDispatch,
    // keeps COM initialized while the object is alive
    _apartment: Rc<Apartment>,
}

impl Dispatch {
    pub(super) fn new(object: IDispatch, apartment: Rc<Apartment>) -> Self {
        Self {
            object,
            _apartment: apartment,
        }
    }

    fn dispid(&self, name: &str) -> HostResult<i32> {
        let wide = HSTRING::from(name);
        let names = [PCWSTR(wide.as_ptr())];
        let mut dispid = 0i32;
        unsafe {
            self.object
                .GetIDsOfNames(&GUID::zeroed(), names.as_ptr(), 1, 0, &mut dispid)
        }
        .map_err(|e| map_error(name, e, None))?;
        Ok(dispid)
    }

    fn invoke(&self, name: &str, flags: DISPATCH_FLAGS, args: Vec<VARIANT>) -> HostResult<VARIANT> {
        let dispid = self.dispid(name)?;
        // arguments travel right to left
        let mut args: Vec<VARIANT> = args.into_iter().rev().collect();
        let mut named = DISPID_PROPERTYPUT;
        let params = DISPPARAMS {
            rgvarg: args.as_mut_ptr(),
            rgdispidNamedArgs: if flags == DISPATCH_PROPERTYPUT {
                &mut named
            } else {
                std::ptr::null_mut()
            },
            cArgs: args.len() as u32,
            cNamedArgs: u32::from(flags == DISPATCH_PROPERTYPUT),
        };

        let mut result = VARIANT::default();
        let mut exception = EXCEPINFO::default();
        let outcome = unsafe {
            self.object.Invoke(
                dispid,
                &GUID::zeroed(),
                0,
                flags,
                &params,
                Some(&mut result),
                Some(&mut exception),
                None,
            )
        };
        match outcome {
            Ok(()) => Ok(result),
            Err(e) => Err(map_error(name, e, Some(exception))),
        }
    }

    pub(super) fn get(&self, name: &str) -> HostResult<VARIANT> {
        self.invoke(name, DISPATCH_PROPERTYGET, Vec::new())
    }

    /// Indexed property, e.g. `Item(1)` or `FileNames(1)`
    pub(super) fn get_at(&self, name: &str, args: Vec<VARIANT>) -> HostResult<VARIANT> {
        self.invoke(name, DISPATCH_PROPERTYGET | DISPATCH_METHOD, args)
    }

    pub(super) fn call(&self, name: &str, args: Vec<VARIANT>) -> HostResult<VARIANT> {
        self.invoke(name, DISPATCH_METHOD, args)
    }

    pub(super) fn put(&self, name: &str, value: VARIANT) -> HostResult<()> {
        self.invoke(name, DISPATCH_PROPERTYPUT, vec![value]).map(|_| ())
    }

    pub(super) fn get_string(&self, name: &str) -> HostResult<String> {
        to_string(name, &self.get(name)?)
    }

    pub(super) fn get_bool(&self, name: &str) -> HostResult<bool> {
        bool::try_from(&self.get(name)?).map_err(|e| map_error(name, e, None))
    }

    pub(super) fn get_i32(&self, name: &str) -> HostResult<i32> {
        i32::try_from(&self.get(name)?).map_err(|e| map_error(name, e, None))
    }

    pub(super) fn get_object(&self, name: &str) -> HostResult<Dispatch> {
        let value = self.get(name)?;
        self.object_from(name, &value)
    }

    /// `name` as an object, `None` when the host returns nothing
    pub(super) fn get_optional_object(&self, name: &str) -> HostResult<Option<Dispatch>> {
        let value = self.get(name)?;
        if value.is_empty() {
            return Ok(None);
        }
        match self.object_from(name, &value) {
            Ok(object) => Ok(Some(object)),
            Err(HostError::Unavailable(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub(super) fn object_from(&self, name: &str, value: &VARIANT) -> HostResult<Dispatch> {
        let unknown = IUnknown::try_from(value)
            .map_err(|_| HostError::Unavailable(name.to_string()))?;
        let object = unknown
            .cast::<IDispatch>()
            .map_err(|_| HostError::Unavailable(name.to_string()))?;
        Ok(Dispatch::new(object, Rc::clone(&self._apartment)))
    }

    /// Members of a one-based automation collection
    pub(super) fn collection(&self, name: &str) -> HostResult<Vec<Dispatch>> {
        let Some(collection) = self.get_optional_object(name)? else {
            return Ok(Vec::new());
        };
        let count = collection.get_i32("Count")?;
        (1..=count)
            .map(|index| {
                let item = collection.get_at("Item", vec![VARIANT::from(index)])?;
                collection.object_from("Item", &item)
            })
            .collect()
    }
}

pub(super) fn to_string(name: &str, value: &VARIANT) -> HostResult<String> {
    if value.is_empty() {
        return Ok(String::new());
    }
    BSTR::try_from(value)
        .map(|text| text.to_string())
        .map_err(|e| map_error(name, e, None))
}

pub(super) fn text(value: &str) -> VARIANT {
    VARIANT::from(BSTR::from(value))
}

fn map_error(member: &str, error: windows::core::Error, exception: Option<EXCEPINFO>) -> HostError {
    let code = error.code();
    if code == RPC_E_CALL_REJECTED || code == RPC_E_SERVERCALL_RETRYLATER {
        HostError::Busy
    } else if code == DISP_E_UNKNOWNNAME || code == DISP_E_MEMBERNOTFOUND || code == RPC_E_DISCONNECTED {
        HostError::Unavailable(member.to_string())
    } else if code == DISP_E_EXCEPTION {
        let description = exception.and_then(description).unwrap_or_else(|| error.message());
        HostError::Failed(description)
    } else {
        HostError::Failed(format!("{member}: {}", error.message()))
    }
}

fn description(mut exception: EXCEPINFO) -> Option<String> {
    let (description, source, help) = unsafe {
        (
            ManuallyDrop::take(&mut exception.bstrDescription),
            ManuallyDrop::take(&mut exception.bstrSource),
            ManuallyDrop::take(&mut exception.bstrHelpFile),
        )
    };
    drop((source, help));
    let text = description.to_string();
    (!text.trim().is_empty()).then_some(text)
}
