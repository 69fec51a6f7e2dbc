//! Program image and metadata store
//!
//! A [`ProgramImage`] is the loaded program: class descriptors, method
//! descriptors, the constant pool and the code region. It is immutable once
//! loaded and answers the resolution queries the interpreter needs.

use serde::{Deserialize, Serialize};

use core_types::{MethodRef, VmConfig, VmError};

/// Where a bytecode address points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Storage {
    /// Code uploaded into RAM
    Transient,
    /// Code kept in persistent storage (EEPROM or flash)
    Persistent,
}

/// A decoded image address.
///
/// # Examples
///
/// ```
/// use bytecode_system::{ImageAddress, Storage};
///
/// let addr = ImageAddress::decode(0x8010, 0x8000);
/// assert_eq!(addr.storage, Storage::Persistent);
/// assert_eq!(addr.offset, 0x10);
/// assert_eq!(addr.encode(0x8000), 0x8010);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageAddress {
    /// Storage the address refers to
    pub storage: Storage,
    /// Offset into the code region
    pub offset: u32,
}

impl ImageAddress {
    /// Splits the persistent-storage flag from a raw address.
    pub fn decode(raw: u32, flag: u32) -> Self {
        if flag != 0 && raw & flag != 0 {
            ImageAddress {
                storage: Storage::Persistent,
                offset: raw & !flag,
            }
        } else {
            ImageAddress {
                storage: Storage::Transient,
                offset: raw,
            }
        }
    }

    /// Raw address with the flag applied for persistent storage.
    pub fn encode(self, flag: u32) -> u32 {
        match self.storage {
            Storage::Persistent => self.offset | flag,
            Storage::Transient => self.offset,
        }
    }
}

/// Class metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    /// Class id (below the native class base)
    pub id: u16,
    /// Parent class; may be a native class such as `Object`
    #[serde(default)]
    pub parent: Option<u16>,
    /// Instance slot count, inherited fields included
    #[serde(default)]
    pub fields: u16,
}

/// Where a method's implementation lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MethodBody {
    /// Bytecode in the code region
    Bytecode {
        /// Raw address, possibly carrying the persistent-storage flag
        address: u32,
        /// Code length in bytes
        len: u32,
    },
    /// Implemented by a native family
    Native,
}

/// Method metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Declaring class
    pub class_id: u16,
    /// Method id within the class
    pub method_id: u16,
    /// Argument slots, receiver included
    #[serde(default)]
    pub args: u8,
    /// Local variable slots
    #[serde(default)]
    pub max_locals: u8,
    /// Operand stack slots the method needs
    #[serde(default)]
    pub max_stack: u8,
    /// Implementation
    pub body: MethodBody,
}

impl MethodDescriptor {
    /// Reference naming this method.
    pub fn method_ref(&self) -> MethodRef {
        MethodRef::new(self.class_id, self.method_id)
    }

    /// Number of locals a frame for this method needs.
    pub fn frame_locals(&self) -> usize {
        self.max_locals.max(self.args) as usize
    }

    /// Returns true for native-marked methods.
    pub fn is_native(&self) -> bool {
        matches!(self.body, MethodBody::Native)
    }
}

/// Constant pool entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Constant {
    /// Integer constant
    Int(i32),
    /// Float constant
    Float(f32),
    /// String literal
    Str(String),
}

/// Result of resolving a method reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// Bytecode or native-marked method described by the image (index into
    /// [`ProgramImage::methods`])
    Method(usize),
    /// Reached a native class; the reference goes to the native bridge
    Native(MethodRef),
}

/// A loaded program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramImage {
    /// User classes
    #[serde(default)]
    pub classes: Vec<ClassDescriptor>,
    /// Methods of the user classes
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
    /// Constant pool
    #[serde(default)]
    pub constants: Vec<Constant>,
    /// Code region
    #[serde(default)]
    pub code: Vec<u8>,
    /// Number of static field slots
    #[serde(default)]
    pub static_fields: u16,
    /// Entry point
    pub main: MethodRef,
}

impl ProgramImage {
    /// Parses a JSON image.
    pub fn from_json(text: &str) -> Result<Self, VmError> {
        serde_json::from_str(text).map_err(|e| VmError::InvalidImage(e.to_string()))
    }

    /// Renders the image as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, VmError> {
        serde_json::to_string_pretty(self).map_err(|e| VmError::InvalidImage(e.to_string()))
    }

    /// Class descriptor by id.
    pub fn class(&self, id: u16) -> Result<&ClassDescriptor, VmError> {
        self.classes
            .iter()
            .find(|c| c.id == id)
            .ok_or(VmError::UnknownClass { class_id: id })
    }

    /// Method descriptor by index.
    pub fn method(&self, index: usize) -> Result<&MethodDescriptor, VmError> {
        self.methods.get(index).ok_or_else(|| {
            VmError::InvalidImage(format!("method index {} out of range", index))
        })
    }

    /// Index of the method declared exactly on `class_id`.
    pub fn find_method(&self, class_id: u16, method_id: u16) -> Option<usize> {
        self.methods
            .iter()
            .position(|m| m.class_id == class_id && m.method_id == method_id)
    }

    /// Resolves `method_id` starting at `class_id`.
    ///
    /// With `inherit` the parent chain is walked until the method is found or
    /// a native class is reached. Without it only the starting class is
    /// searched.
    pub fn resolve(
        &self,
        config: &VmConfig,
        class_id: u16,
        method_id: u16,
        inherit: bool,
    ) -> Result<Resolved, VmError> {
        let unresolved = VmError::UnresolvedMethod {
            class_id,
            method_id,
        };
        let mut current = class_id;
        for _ in 0..=self.classes.len() {
            if config.native.is_native(current) {
                return Ok(Resolved::Native(MethodRef::new(current, method_id)));
            }
            if let Some(index) = self.find_method(current, method_id) {
                return Ok(Resolved::Method(index));
            }
            if !inherit {
                return Err(unresolved);
            }
            match self.class(current)?.parent {
                Some(parent) => current = parent,
                None => return Err(unresolved),
            }
        }
        Err(VmError::InvalidImage(format!(
            "class {} has a cyclic parent chain",
            class_id
        )))
    }

    /// Returns true if `class_id` is `ancestor` or derives from it.
    pub fn is_subclass(&self, class_id: u16, ancestor: u16) -> bool {
        let mut current = Some(class_id);
        for _ in 0..=self.classes.len() {
            match current {
                Some(id) if id == ancestor => return true,
                Some(id) => current = self.class(id).ok().and_then(|c| c.parent),
                None => return false,
            }
        }
        false
    }

    /// Bytecode of a method, with the storage flag stripped from its address.
    pub fn method_code(&self, method: &MethodDescriptor, flag: u32) -> Result<&[u8], VmError> {
        match method.body {
            MethodBody::Bytecode { address, len } => {
                let start = ImageAddress::decode(address, flag).offset as usize;
                let end = start + len as usize;
                self.code.get(start..end).ok_or_else(|| {
                    VmError::InvalidImage(format!(
                        "method {} code {}..{} outside code region of {} bytes",
                        method.method_ref(),
                        start,
                        end,
                        self.code.len()
                    ))
                })
            }
            MethodBody::Native => Err(VmError::InvalidImage(format!(
                "method {} has no bytecode",
                method.method_ref()
            ))),
        }
    }

    /// Constant pool entry.
    pub fn constant(&self, index: usize) -> Result<&Constant, VmError> {
        self.constants
            .get(index)
            .ok_or(VmError::InvalidConstant { index })
    }

    /// String constant.
    pub fn string(&self, index: usize) -> Result<&str, VmError> {
        match self.constant(index)? {
            Constant::Str(s) => Ok(s),
            _ => Err(VmError::InvalidConstant { index }),
        }
    }

    /// Checks the image against the configuration it will run under.
    pub fn validate(&self, config: &VmConfig) -> Result<(), VmError> {
        let invalid = |msg: String| Err(VmError::InvalidImage(msg));

        if self.code.len() > config.code_size {
            return invalid(format!(
                "code region of {} bytes exceeds the {} byte limit",
                self.code.len(),
                config.code_size
            ));
        }

        for (i, class) in self.classes.iter().enumerate() {
            if config.native.is_native(class.id) {
                return invalid(format!(
                    "class {} lies in the native class range (>= {})",
                    class.id, config.native.class_base
                ));
            }
            if self.classes[..i].iter().any(|c| c.id == class.id) {
                return invalid(format!("duplicate class {}", class.id));
            }
            if let Some(parent) = class.parent {
                if !config.native.is_native(parent) && self.class(parent).is_err() {
                    return invalid(format!(
                        "class {} has unknown parent {}",
                        class.id, parent
                    ));
                }
            }
            if !self.reaches_root(class.id) {
                return invalid(format!("class {} has a cyclic parent chain", class.id));
            }
        }

        let layout = config.native.layout();
        for (i, method) in self.methods.iter().enumerate() {
            let r = method.method_ref();
            r.pack(layout)?;
            self.class(method.class_id).map_err(|_| {
                VmError::InvalidImage(format!("method {} belongs to unknown class", r))
            })?;
            if self.methods[..i].iter().any(|m| m.method_ref() == r) {
                return invalid(format!("duplicate method {}", r));
            }
            if let MethodBody::Bytecode { .. } = method.body {
                self.method_code(method, config.nvmfile_flag)?;
            }
        }

        match self.find_method(self.main.class_id, self.main.method_id) {
            Some(index) if !self.methods[index].is_native() => Ok(()),
            Some(_) => invalid(format!("entry point {} is native", self.main)),
            None => invalid(format!("entry point {} not found", self.main)),
        }
    }

    fn reaches_root(&self, class_id: u16) -> bool {
        let mut current = Some(class_id);
        // every user class, then a native parent, then the end of the chain
        for _ in 0..self.classes.len() + 2 {
            match current {
                None => return true,
                Some(id) => current = self.class(id).ok().and_then(|c| c.parent),
            }
        }
        false
    }
}
