//! Build-profile configuration.
//!
//! On the device these are compile-time constants; here they are assembled
//! once into a [`VmConfig`] and passed explicitly to every component that
//! needs them. Two presets mirror the reference targets: [`VmConfig::unix`]
//! (desktop development host) and [`VmConfig::asuro`] (ATmega8 robot).

use serde::{Deserialize, Serialize};

use crate::error::VmError;
use crate::method_ref::RefLayout;

/// Hard upper bound on nested frames; frame storage is preallocated to this.
pub const MAX_CALL_DEPTH: usize = 128;

/// Native word width of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordWidth {
    /// 16-bit words (AVR targets)
    Word16,
    /// 32-bit words (desktop host)
    Word32,
}

impl WordWidth {
    /// Width in bits.
    pub fn bits(self) -> u32 {
        match self {
            WordWidth::Word16 => 16,
            WordWidth::Word32 => 32,
        }
    }

    /// Width in bytes; the size of one heap slot.
    pub fn bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Bits available to integer values. One bit of every word is reserved
    /// for the reference tag.
    pub fn value_bits(self) -> u32 {
        self.bits() - 1
    }

    /// Wrap an integer result to the value width (two's complement).
    ///
    /// ```
    /// use core_types::WordWidth;
    ///
    /// assert_eq!(WordWidth::Word16.wrap(16383 + 1), -16384);
    /// assert_eq!(WordWidth::Word16.wrap(-1), -1);
    /// assert_eq!(WordWidth::Word32.wrap(0x4000_0000), -0x4000_0000);
    /// ```
    pub fn wrap(self, n: i32) -> i32 {
        let shift = 32 - self.value_bits();
        n.wrapping_shl(shift) >> shift
    }

    /// Largest integer representable.
    pub fn max_int(self) -> i32 {
        ((1i64 << (self.value_bits() - 1)) - 1) as i32
    }

    /// Smallest integer representable.
    pub fn min_int(self) -> i32 {
        (-(1i64 << (self.value_bits() - 1))) as i32
    }
}

/// What happens when a method returns with values left on its operand stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackCheck {
    /// Stack-balance checking enabled: residue is a fatal fault
    Verify,
    /// Checking disabled: residue is dropped with the frame
    Discard,
    /// Checking disabled: residue stays on the caller's stack
    Retain,
}

/// Optional interpreter features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    /// Array allocation and element access
    pub arrays: bool,
    /// `tableswitch` / `lookupswitch`
    pub switch: bool,
    /// Virtual dispatch through parent classes
    pub inheritance: bool,
    /// Floating-point values and opcodes
    pub float: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            arrays: true,
            switch: true,
            inheritance: true,
            float: false,
        }
    }
}

/// Native class families compiled into the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilySet {
    /// Console streams and string buffers
    pub stdio: bool,
    /// AVR peripherals (ports, timer, ADC, PWM)
    pub avr: bool,
    /// Character display
    pub lcd: bool,
    /// Asuro robot
    pub asuro: bool,
}

/// Identifier space reserved for native classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeConfig {
    /// Lowest native class id; user classes sit below it
    pub class_base: u16,
    /// Low bits of a packed method reference holding the method id
    pub method_bits: u8,
}

impl NativeConfig {
    /// Packing layout for method references.
    pub fn layout(&self) -> RefLayout {
        RefLayout {
            method_bits: self.method_bits,
        }
    }

    /// Whether the class id belongs to the native range.
    pub fn is_native(&self, class_id: u16) -> bool {
        class_id >= self.class_base
    }
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            class_base: 16,
            method_bits: 8,
        }
    }
}

/// Complete VM configuration.
///
/// # Examples
///
/// ```
/// use core_types::{StackCheck, VmConfig, WordWidth};
///
/// let config = VmConfig::asuro();
/// assert_eq!(config.word, WordWidth::Word16);
/// assert_eq!(config.stack_check, StackCheck::Discard);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Size of the code region in bytes
    pub code_size: usize,
    /// Size of the heap arena in bytes
    pub heap_size: usize,
    /// Operand stack capacity in slots
    pub stack_size: usize,
    /// Maximum number of nested frames
    pub max_call_depth: usize,
    /// Word width of the target
    pub word: WordWidth,
    /// Optional interpreter features
    pub features: Features,
    /// Residual operand stack policy on return
    pub stack_check: StackCheck,
    /// Address bit marking items stored in persistent memory
    pub nvmfile_flag: u32,
    /// Native identifier space
    pub native: NativeConfig,
    /// Native families compiled in
    pub families: FamilySet,
    /// Log every executed instruction
    pub trace: bool,
}

impl VmConfig {
    /// Desktop host profile.
    pub fn unix() -> Self {
        Self {
            code_size: 32768,
            heap_size: 768,
            stack_size: 128,
            max_call_depth: 32,
            word: WordWidth::Word32,
            features: Features {
                arrays: true,
                switch: true,
                inheritance: true,
                float: true,
            },
            stack_check: StackCheck::Verify,
            nvmfile_flag: 0x4000_0000,
            native: NativeConfig::default(),
            families: FamilySet {
                stdio: true,
                ..FamilySet::default()
            },
            trace: false,
        }
    }

    /// Asuro robot profile.
    pub fn asuro() -> Self {
        Self {
            code_size: 512,
            heap_size: 768,
            stack_size: 32,
            max_call_depth: 8,
            word: WordWidth::Word16,
            features: Features {
                arrays: true,
                switch: true,
                inheritance: true,
                float: false,
            },
            stack_check: StackCheck::Discard,
            nvmfile_flag: 0x8000,
            native: NativeConfig::default(),
            families: FamilySet {
                stdio: true,
                asuro: true,
                ..FamilySet::default()
            },
            trace: false,
        }
    }

    /// Parse a configuration from JSON. Missing fields take the `unix` values.
    pub fn from_json(text: &str) -> Result<Self, VmError> {
        let config: VmConfig =
            serde_json::from_str(text).map_err(|e| VmError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Heap capacity in slots.
    pub fn heap_slots(&self) -> usize {
        self.heap_size / self.word.bytes()
    }

    /// Reject inconsistent settings.
    pub fn validate(&self) -> Result<(), VmError> {
        let fail = |msg: String| Err(VmError::InvalidConfig(msg));

        if self.code_size == 0 || self.stack_size == 0 {
            return fail("code and stack sizes must be non-zero".into());
        }
        if self.max_call_depth == 0 || self.max_call_depth > MAX_CALL_DEPTH {
            return fail(format!(
                "max_call_depth must be within 1..={}",
                MAX_CALL_DEPTH
            ));
        }
        if self.features.float && self.word != WordWidth::Word32 {
            return fail("float support requires 32-bit words".into());
        }
        if self.nvmfile_flag.count_ones() != 1
            || self.nvmfile_flag.trailing_zeros() >= self.word.bits()
        {
            return fail(format!(
                "nvmfile_flag 0x{:x} must be a single bit inside the word",
                self.nvmfile_flag
            ));
        }
        if !(1..=15).contains(&self.native.method_bits) {
            return fail("native.method_bits must be within 1..=15".into());
        }
        if self.native.class_base > self.native.layout().max_class_id() {
            return fail(format!(
                "native.class_base {} does not fit the method reference layout",
                self.native.class_base
            ));
        }
        Ok(())
    }
}

impl Default for VmConfig {
    fn default() -> Self {
        Self::unix()
    }
}
