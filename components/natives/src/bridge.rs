//! Native dispatch bridge
//!
//! Routes calls on native classes to the first family in the chain that
//! handles the class. The chain order is fixed by [`FamilyKind`]; within a
//! kind, earlier registrations win.

use core_types::{debug, warn, FamilySet, MethodRef, Value, VmConfig, VmError};

use crate::console::Console;
use crate::family::{FamilyKind, NativeContext, NativeFamily};
use crate::ids;
use crate::object::ObjectFamily;
use crate::stdio::StdioFamily;

/// Registry of native families.
///
/// # Examples
///
/// ```
/// use bytecode_system::ProgramBuilder;
/// use core_types::{MethodRef, Value, VmError};
/// use memory_manager::{Heap, OperandStack};
/// use natives::{ids, FamilyKind, NativeBridge, NativeContext, ObjectFamily};
///
/// let mut bridge = NativeBridge::new();
/// bridge.register(FamilyKind::Object, Box::new(ObjectFamily)).unwrap();
///
/// let image = ProgramBuilder::new().build();
/// let mut heap = Heap::with_slot_capacity(4);
/// let mut stack = OperandStack::new(4);
/// stack.push(Value::Int(1)).unwrap();
///
/// let mut ctx = NativeContext::new(&mut stack, &mut heap, &image);
/// bridge.invoke(MethodRef::new(ids::OBJECT, ids::METHOD_INIT), &mut ctx).unwrap();
/// assert!(stack.is_empty());
/// ```
#[derive(Default)]
pub struct NativeBridge {
    families: Vec<(FamilyKind, Box<dyn NativeFamily>)>,
    /// Families the profile admits; `None` admits every kind
    enabled: Option<FamilySet>,
}

impl NativeBridge {
    /// Creates a bridge with no families that accepts every kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the bridge for a build profile: the object family, then the
    /// console family when enabled.
    ///
    /// Peripheral, display and robot handlers are provided by the embedding
    /// through [`register`](Self::register), which only accepts the kinds the
    /// profile compiles in.
    pub fn for_config(config: &VmConfig, console: Console) -> Result<Self, VmError> {
        if config.native.class_base != ids::CLASS_BASE {
            return Err(VmError::InvalidConfig(format!(
                "native families use class base {}, configuration has {}",
                ids::CLASS_BASE,
                config.native.class_base
            )));
        }

        let mut bridge = Self {
            families: Vec::new(),
            enabled: Some(config.families),
        };
        bridge.register(FamilyKind::Object, Box::new(ObjectFamily))?;
        if config.families.stdio {
            bridge.register(FamilyKind::Console, Box::new(StdioFamily::new(console)))?;
        }
        for kind in bridge.unserved() {
            warn!("{} natives enabled but no handler registered", kind.name());
        }
        Ok(bridge)
    }

    /// Adds a family at its place in the chain.
    ///
    /// Fails with [`VmError::InvalidConfig`] when the profile does not
    /// compile in `kind`; the chain is left unchanged.
    pub fn register(
        &mut self,
        kind: FamilyKind,
        family: Box<dyn NativeFamily>,
    ) -> Result<&mut Self, VmError> {
        if let Some(enabled) = &self.enabled {
            if !kind.enabled(enabled) {
                return Err(VmError::InvalidConfig(format!(
                    "{} natives are not enabled in this configuration",
                    kind.name()
                )));
            }
        }
        let at = self
            .families
            .iter()
            .position(|(k, _)| *k > kind)
            .unwrap_or(self.families.len());
        debug!("registered native family {} as {}", family.name(), kind.name());
        self.families.insert(at, (kind, family));
        Ok(self)
    }

    /// Enabled kinds that have no family yet.
    pub fn unserved(&self) -> Vec<FamilyKind> {
        let Some(enabled) = &self.enabled else {
            return Vec::new();
        };
        FamilyKind::ALL
            .into_iter()
            .filter(|kind| kind.enabled(enabled))
            .filter(|kind| self.families.iter().all(|(k, _)| k != kind))
            .collect()
    }

    /// Names of the registered families in chain order.
    pub fn family_names(&self) -> Vec<&'static str> {
        self.families.iter().map(|(_, f)| f.name()).collect()
    }

    /// Returns true if some family handles `class_id`.
    pub fn handles(&self, class_id: u16) -> bool {
        self.families.iter().any(|(_, f)| f.handles(class_id))
    }

    /// Executes a native method.
    pub fn invoke(&mut self, method: MethodRef, ctx: &mut NativeContext<'_>) -> Result<(), VmError> {
        let class_name = ids::class_name(method.class_id).unwrap_or("unnamed class");
        let Some((_, family)) = self
            .families
            .iter_mut()
            .find(|(_, f)| f.handles(method.class_id))
        else {
            warn!("no native family handles {} ({})", method.class_id, class_name);
            return Err(VmError::UnknownNativeClass {
                class_id: method.class_id,
            });
        };
        debug!("native {} ({}) -> {}", method, class_name, family.name());
        family.invoke(method, ctx)
    }

    /// Instantiates a native class for `new`.
    ///
    /// Only `StringBuffer` can be instantiated: a one-slot block is
    /// allocated and its reference pushed. Any other class fails without
    /// side effects.
    pub fn construct(&self, class_id: u16, ctx: &mut NativeContext<'_>) -> Result<(), VmError> {
        if class_id != ids::STRINGBUFFER {
            return Err(VmError::UnknownNativeClass { class_id });
        }
        let r = ctx.heap.allocate(false, 1)?;
        ctx.stack.push(Value::Ref(r))
    }
}

impl std::fmt::Debug for NativeBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBridge")
            .field("families", &self.family_names())
            .finish()
    }
}
