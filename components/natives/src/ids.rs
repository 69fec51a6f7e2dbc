//! Native class and method identifiers.
//!
//! Class ids start at [`CLASS_BASE`]; everything below belongs to the
//! program's own classes.

/// First native class id.
pub const CLASS_BASE: u16 = 16;

/// `java.lang.Object`
pub const OBJECT: u16 = CLASS_BASE;
/// `java.io.PrintStream`
pub const PRINTSTREAM: u16 = CLASS_BASE + 1;
/// `java.io.InputStream`
pub const INPUTSTREAM: u16 = CLASS_BASE + 2;
/// `java.lang.StringBuffer`
pub const STRINGBUFFER: u16 = CLASS_BASE + 3;

/// `nanovm.avr.AVR`
pub const AVR: u16 = CLASS_BASE + 4;
/// `nanovm.avr.Port`
pub const PORT: u16 = CLASS_BASE + 5;
/// `nanovm.avr.Timer`
pub const TIMER: u16 = CLASS_BASE + 6;
/// `nanovm.avr.Adc`
pub const ADC: u16 = CLASS_BASE + 7;
/// `nanovm.avr.Pwm`
pub const PWM: u16 = CLASS_BASE + 8;
/// `nanovm.lcd.Lcd`
pub const LCD: u16 = CLASS_BASE + 9;
/// `nanovm.asuro.Asuro`
pub const ASURO: u16 = CLASS_BASE + 10;

/// Constructor method id, shared by every native class.
pub const METHOD_INIT: u16 = 0;

/// `PrintStream` methods.
pub mod printstream {
    /// `println(String)`
    pub const PRINTLN_STR: u16 = 1;
    /// `println(int)`
    pub const PRINTLN_INT: u16 = 2;
    /// `println(char)`
    pub const PRINTLN_CHAR: u16 = 3;
    /// `print(String)`
    pub const PRINT_STR: u16 = 4;
    /// `print(int)`
    pub const PRINT_INT: u16 = 5;
    /// `print(char)`
    pub const PRINT_CHAR: u16 = 6;
    /// `println()`
    pub const PRINTLN: u16 = 7;
    /// `println(float)`
    pub const PRINTLN_FLOAT: u16 = 8;
    /// `print(float)`
    pub const PRINT_FLOAT: u16 = 9;
}

/// `InputStream` methods.
pub mod inputstream {
    /// `available()`
    pub const AVAILABLE: u16 = 1;
    /// `read()`
    pub const READ: u16 = 2;
}

/// `StringBuffer` methods.
pub mod stringbuffer {
    /// `<init>()`
    pub const INIT: u16 = super::METHOD_INIT;
    /// `<init>(String)`
    pub const INIT_STR: u16 = 1;
    /// `append(String)`
    pub const APPEND_STR: u16 = 2;
    /// `append(int)`
    pub const APPEND_INT: u16 = 3;
    /// `append(char)`
    pub const APPEND_CHAR: u16 = 4;
    /// `toString()`
    pub const TO_STRING: u16 = 5;
    /// `append(float)`
    pub const APPEND_FLOAT: u16 = 6;
}

/// Name of a native class, for diagnostics.
///
/// ```
/// use natives::ids;
///
/// assert_eq!(ids::class_name(ids::STRINGBUFFER), Some("java/lang/StringBuffer"));
/// assert_eq!(ids::class_name(3), None);
/// ```
pub fn class_name(class_id: u16) -> Option<&'static str> {
    Some(match class_id {
        OBJECT => "java/lang/Object",
        PRINTSTREAM => "java/io/PrintStream",
        INPUTSTREAM => "java/io/InputStream",
        STRINGBUFFER => "java/lang/StringBuffer",
        AVR => "nanovm/avr/AVR",
        PORT => "nanovm/avr/Port",
        TIMER => "nanovm/avr/Timer",
        ADC => "nanovm/avr/Adc",
        PWM => "nanovm/avr/Pwm",
        LCD => "nanovm/lcd/Lcd",
        ASURO => "nanovm/asuro/Asuro",
        _ => return None,
    })
}
