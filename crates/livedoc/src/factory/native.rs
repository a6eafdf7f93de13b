// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! [`DocumentUnit`] over a loaded shared library.
//!
//! The library exports a `#[repr(C)]` vtable under
//! [`UNIT_ENTRY_SYMBOL`]. Strings cross the boundary as NUL-terminated JSON
//! and every string the unit returns is released with its own
//! `free_string`. Predicates return `1`, `0`, or a negative value when
//! the call failed inside the unit.

use super::{
    ClientRegistry, DocumentInstance, DocumentMonitor, DocumentUnit, GenericClient,
    HeaderDecryptor, InvokeError, Principal, RequestContext,
};
use crate::codegen::{UNIT_ABI_VERSION, UNIT_ENTRY_SYMBOL};
use crate::compile::{Library, LoadError};
use serde::Deserialize;
use serde_json::Value;
use std::ffi::{c_char, c_void, CStr, CString};
use std::sync::Arc;

#[repr(C)]
#[derive(Clone, Copy)]
struct RawMonitor {
    context: *mut c_void,
    on_patch: Option<unsafe extern "C" fn(*mut c_void, *const c_char)>,
}

/// Mirror of the vtable rendered into every unit.
#[repr(C)]
struct UnitVTable {
    abi_version: u32,
    construct: unsafe extern "C" fn(RawMonitor) -> *mut c_void,
    destroy: unsafe extern "C" fn(*mut c_void),
    can_create: unsafe extern "C" fn(*const c_char) -> i32,
    can_invent: unsafe extern "C" fn(*const c_char) -> i32,
    can_send_while_disconnected: unsafe extern "C" fn(*const c_char) -> i32,
    config: unsafe extern "C" fn() -> *mut c_char,
    services: unsafe extern "C" fn() -> *mut c_char,
    generic_clients: unsafe extern "C" fn() -> *mut c_char,
    get_tests: unsafe extern "C" fn() -> *mut c_char,
    transact_construct:
        unsafe extern "C" fn(*mut c_void, *const c_char, *const c_char) -> *mut c_char,
    late_bind: unsafe extern "C" fn(*mut c_void, *const c_char, *const c_char) -> i32,
    run_test: unsafe extern "C" fn(*mut c_void, *const c_char) -> *mut c_char,
    free_string: unsafe extern "C" fn(*mut c_char),
}

/// Library plus its vtable; the vtable is only valid while the library is
/// mapped, so both live together.
struct Bound {
    vtable: *const UnitVTable,
    _library: Library,
}

// The vtable is immutable static data inside the library, and every entry
// point is reentrant.
unsafe impl Send for Bound {}
unsafe impl Sync for Bound {}

impl Bound {
    fn vtable(&self) -> &UnitVTable {
        // SAFETY: non-null, checked at bind time; lives as long as `_library`.
        unsafe { &*self.vtable }
    }

    /// Take ownership of a string returned by the unit.
    fn take_string(&self, raw: *mut c_char, what: &str) -> Result<String, InvokeError> {
        if raw.is_null() {
            return Err(InvokeError::new(format!("{what} failed inside the unit")));
        }
        // SAFETY: the unit returns NUL-terminated strings from CString::into_raw.
        let value = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
        // SAFETY: released exactly once, through the allocator that made it.
        unsafe { (self.vtable().free_string)(raw) };
        Ok(value)
    }

    fn predicate(
        &self,
        entry: unsafe extern "C" fn(*const c_char) -> i32,
        context: &RequestContext,
        what: &str,
    ) -> Result<bool, InvokeError> {
        let json = serde_json::to_string(context)
            .map_err(|e| InvokeError::new(format!("{what}: {e}")))?;
        let json = c_string(&json)?;
        // SAFETY: json outlives the call.
        match unsafe { entry(json.as_ptr()) } {
            1 => Ok(true),
            0 => Ok(false),
            status => Err(InvokeError::new(format!("{what} failed with status {status}"))),
        }
    }
}

fn c_string(value: &str) -> Result<CString, InvokeError> {
    CString::new(value).map_err(|_| InvokeError::new("string contains NUL"))
}

/// A unit loaded from a shared library.
pub struct NativeUnit {
    bound: Arc<Bound>,
}

impl std::fmt::Debug for NativeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeUnit").finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct ClientDescriptor {
    service: String,
    class: String,
}

impl NativeUnit {
    /// Resolve the vtable of `library` and check its ABI version.
    pub fn bind(library: Library) -> Result<Self, LoadError> {
        // SAFETY: the symbol is the vtable static rendered by the unit glue.
        let vtable: *const UnitVTable = unsafe { library.symbol::<UnitVTable>(UNIT_ENTRY_SYMBOL)? };
        // SAFETY: dlsym returned a non-null address of the static.
        let found = unsafe { (*vtable).abi_version };
        if found != UNIT_ABI_VERSION {
            return Err(LoadError::AbiMismatch {
                expected: UNIT_ABI_VERSION,
                found,
            });
        }
        log::debug!("[factory] bound unit '{}' (abi {})", library.name(), found);
        Ok(Self {
            bound: Arc::new(Bound {
                vtable,
                _library: library,
            }),
        })
    }
}

unsafe extern "C" fn monitor_trampoline(context: *mut c_void, patch: *const c_char) {
    if context.is_null() || patch.is_null() {
        return;
    }
    // SAFETY: context is the Box<Arc<dyn DocumentMonitor>> owned by the
    // instance, alive until after destroy.
    let monitor = &*context.cast::<Arc<dyn DocumentMonitor>>();
    let patch = CStr::from_ptr(patch).to_string_lossy();
    monitor.on_patch(&patch);
}

impl DocumentUnit for NativeUnit {
    fn construct(
        &self,
        monitor: Arc<dyn DocumentMonitor>,
    ) -> Result<Box<dyn DocumentInstance>, InvokeError> {
        let monitor = Box::into_raw(Box::new(monitor));
        let raw = RawMonitor {
            context: monitor.cast(),
            on_patch: Some(monitor_trampoline),
        };
        // SAFETY: the monitor box stays alive as long as the instance.
        let document = unsafe { (self.bound.vtable().construct)(raw) };
        if document.is_null() {
            // SAFETY: the unit did not keep the monitor.
            drop(unsafe { Box::from_raw(monitor) });
            return Err(InvokeError::new("constructor failed inside the unit"));
        }
        Ok(Box::new(NativeInstance {
            bound: Arc::clone(&self.bound),
            document,
            monitor,
        }))
    }

    fn can_create(&self, context: &RequestContext) -> Result<bool, InvokeError> {
        let vtable = self.bound.vtable();
        self.bound.predicate(vtable.can_create, context, "can_create")
    }

    fn can_invent(&self, context: &RequestContext) -> Result<bool, InvokeError> {
        let vtable = self.bound.vtable();
        self.bound.predicate(vtable.can_invent, context, "can_invent")
    }

    fn can_send_while_disconnected(&self, context: &RequestContext) -> Result<bool, InvokeError> {
        let vtable = self.bound.vtable();
        self.bound.predicate(
            vtable.can_send_while_disconnected,
            context,
            "can_send_while_disconnected",
        )
    }

    fn config(&self) -> Result<String, InvokeError> {
        // SAFETY: static entry point without arguments.
        let raw = unsafe { (self.bound.vtable().config)() };
        self.bound.take_string(raw, "config")
    }

    fn services(&self) -> Result<String, InvokeError> {
        // SAFETY: static entry point without arguments.
        let raw = unsafe { (self.bound.vtable().services)() };
        self.bound.take_string(raw, "services")
    }

    fn create_generic_clients(
        &self,
        registry: &ClientRegistry,
        decryptor: Arc<dyn HeaderDecryptor>,
    ) -> Result<usize, InvokeError> {
        // SAFETY: static entry point without arguments.
        let raw = unsafe { (self.bound.vtable().generic_clients)() };
        let json = self.bound.take_string(raw, "generic_clients")?;
        let descriptors: Vec<ClientDescriptor> = serde_json::from_str(&json)
            .map_err(|e| InvokeError::new(format!("generic_clients: {e}")))?;
        let count = descriptors.len();
        for descriptor in descriptors {
            registry.register(GenericClient {
                service: descriptor.service,
                class: descriptor.class,
                decryptor: Arc::clone(&decryptor),
            });
        }
        Ok(count)
    }

    fn tests(&self) -> Result<Vec<String>, InvokeError> {
        // SAFETY: static entry point without arguments.
        let raw = unsafe { (self.bound.vtable().get_tests)() };
        let json = self.bound.take_string(raw, "get_tests")?;
        serde_json::from_str(&json).map_err(|e| InvokeError::new(format!("get_tests: {e}")))
    }
}

struct NativeInstance {
    bound: Arc<Bound>,
    document: *mut c_void,
    monitor: *mut Arc<dyn DocumentMonitor>,
}

// The document is only touched through &mut self.
unsafe impl Send for NativeInstance {}

impl DocumentInstance for NativeInstance {
    fn transact_construct(&mut self, who: &Principal, arg: &str) -> Result<String, InvokeError> {
        let who = serde_json::to_string(who)
            .map_err(|e| InvokeError::new(format!("transact_construct: {e}")))?;
        let (who, arg) = (c_string(&who)?, c_string(arg)?);
        // SAFETY: document is live; strings outlive the call.
        let raw = unsafe {
            (self.bound.vtable().transact_construct)(self.document, who.as_ptr(), arg.as_ptr())
        };
        self.bound.take_string(raw, "transact_construct")
    }

    fn late_bind(&mut self, space: &str, key: &str) -> Result<(), InvokeError> {
        let (space, key) = (c_string(space)?, c_string(key)?);
        // SAFETY: document is live; strings outlive the call.
        let status = unsafe {
            (self.bound.vtable().late_bind)(self.document, space.as_ptr(), key.as_ptr())
        };
        if status == 0 {
            Ok(())
        } else {
            Err(InvokeError::new(format!("late_bind failed with status {status}")))
        }
    }

    fn run_test(&mut self, name: &str) -> Result<Value, InvokeError> {
        let c_name = c_string(name)?;
        // SAFETY: document is live; the name outlives the call.
        let raw = unsafe { (self.bound.vtable().run_test)(self.document, c_name.as_ptr()) };
        let json = self.bound.take_string(raw, &format!("test '{name}'"))?;
        serde_json::from_str(&json).map_err(|e| InvokeError::new(format!("test '{name}': {e}")))
    }
}

impl Drop for NativeInstance {
    fn drop(&mut self) {
        // SAFETY: both pointers were produced in construct and are released
        // once, document first since it may still report to the monitor.
        unsafe {
            (self.bound.vtable().destroy)(self.document);
            drop(Box::from_raw(self.monitor));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Checker;
    use crate::codegen::{generate_unit, DocumentSurface};
    use crate::types::{StructureStorage, TypeNode};
    use std::mem::{offset_of, size_of};

    /// Entry points of [`UnitVTable`] in declaration order.
    const VTABLE_FIELDS: [&str; 14] = [
        "abi_version",
        "construct",
        "destroy",
        "can_create",
        "can_invent",
        "can_send_while_disconnected",
        "config",
        "services",
        "generic_clients",
        "get_tests",
        "transact_construct",
        "late_bind",
        "run_test",
        "free_string",
    ];

    fn glue() -> String {
        let checked = Checker::new(StructureStorage::root().field("n", TypeNode::int())).check();
        let unit = generate_unit(&checked, &DocumentSurface::default(), "abi").expect("generate");
        let start = unit.source.find("// C-ABI surface").expect("glue");
        unit.source[start..].to_string()
    }

    /// Member names of the block opened by `header`, in order.
    fn members<'s>(source: &'s str, header: &str, close: &str) -> Vec<&'s str> {
        let start = source
            .find(header)
            .unwrap_or_else(|| panic!("missing {header}"))
            + header.len();
        let end = start + source[start..].find(close).expect("block end");
        source[start..end]
            .lines()
            .map(str::trim)
            .filter_map(|line| line.split_once(':').map(|(name, _)| name))
            .map(|name| name.trim_start_matches("pub "))
            .filter(|name| !name.is_empty() && !name.contains(' '))
            .collect()
    }

    #[test]
    fn test_mirror_layout_matches_field_list() {
        // u32 is padded up to pointer alignment, every other entry is a pointer.
        assert_eq!(size_of::<UnitVTable>(), size_of::<usize>() * VTABLE_FIELDS.len());
        assert_eq!(offset_of!(UnitVTable, construct), size_of::<usize>());
        assert_eq!(
            offset_of!(UnitVTable, free_string),
            size_of::<usize>() * (VTABLE_FIELDS.len() - 1)
        );
        assert_eq!(size_of::<RawMonitor>(), 2 * size_of::<usize>());
    }

    #[test]
    fn test_rendered_vtable_matches_the_mirror() {
        let glue = glue();
        let declared = members(&glue, "#[repr(C)]\npub struct UnitVTable {", "\n}\n");
        assert_eq!(declared, VTABLE_FIELDS);

        let export =
            format!("#[no_mangle]\npub static {UNIT_ENTRY_SYMBOL}: UnitVTable = UnitVTable {{");
        let initialized = members(&glue, &export, "\n};\n");
        assert_eq!(initialized, VTABLE_FIELDS);
        assert!(glue.contains(&format!("abi_version: {UNIT_ABI_VERSION},")));
        for entry in &VTABLE_FIELDS[1..] {
            assert!(glue.contains(&format!("    {entry}: __glue_{entry},")), "{entry}");
            assert!(glue.contains(&format!("extern \"C\" fn __glue_{entry}(")), "{entry}");
        }
    }

    #[test]
    fn test_rendered_monitor_matches_the_mirror() {
        let glue = glue();
        let header = "#[repr(C)]\n#[derive(Clone, Copy)]\npub struct LivedocMonitor {";
        let monitor = members(&glue, header, "\n}\n");
        assert_eq!(monitor, ["context", "on_patch"]);
    }
}
