//! Instruction set
//!
//! The VM executes a subset of JVM bytecode using the JVM opcode numbers.
//! Anything not listed here is rejected by the decoder.

use core_types::Features;

/// Optional capability an opcode depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Array opcodes
    Arrays,
    /// Multi-way branches
    Switch,
    /// Floating-point opcodes
    Float,
}

impl Feature {
    /// Name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Arrays => "array",
            Feature::Switch => "switch",
            Feature::Float => "float",
        }
    }

    /// Whether the profile enables this feature.
    pub fn enabled(self, features: &Features) -> bool {
        match self {
            Feature::Arrays => features.arrays,
            Feature::Switch => features.switch,
            Feature::Float => features.float,
        }
    }
}

/// Operand length marker for the switch instructions.
const VAR: i8 = -1;

macro_rules! opcodes {
    ($( $name:ident = $code:literal, $mnemonic:literal, $len:expr, $feature:expr; )*) => {
        /// Opcodes understood by the interpreter.
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $(
                #[doc = $mnemonic]
                $name = $code,
            )*
        }

        impl Opcode {
            /// Decode an opcode byte.
            pub fn from_byte(byte: u8) -> Option<Opcode> {
                match byte {
                    $( $code => Some(Opcode::$name), )*
                    _ => None,
                }
            }

            /// Assembler mnemonic.
            pub fn mnemonic(self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Number of immediate bytes following the opcode, `None` for the
            /// variable-length switch instructions.
            pub fn operand_len(self) -> Option<usize> {
                let len: i8 = match self {
                    $( Opcode::$name => $len, )*
                };
                if len == VAR { None } else { Some(len as usize) }
            }

            /// Feature that must be enabled to execute the opcode.
            pub fn feature(self) -> Option<Feature> {
                match self {
                    $( Opcode::$name => $feature, )*
                }
            }
        }
    };
}

const A: Option<Feature> = Some(Feature::Arrays);
const S: Option<Feature> = Some(Feature::Switch);
const F: Option<Feature> = Some(Feature::Float);
const N: Option<Feature> = None;

opcodes! {
    Nop = 0x00, "nop", 0, N;
    AconstNull = 0x01, "aconst_null", 0, N;
    IconstM1 = 0x02, "iconst_m1", 0, N;
    Iconst0 = 0x03, "iconst_0", 0, N;
    Iconst1 = 0x04, "iconst_1", 0, N;
    Iconst2 = 0x05, "iconst_2", 0, N;
    Iconst3 = 0x06, "iconst_3", 0, N;
    Iconst4 = 0x07, "iconst_4", 0, N;
    Iconst5 = 0x08, "iconst_5", 0, N;
    Fconst0 = 0x0b, "fconst_0", 0, F;
    Fconst1 = 0x0c, "fconst_1", 0, F;
    Fconst2 = 0x0d, "fconst_2", 0, F;
    Bipush = 0x10, "bipush", 1, N;
    Sipush = 0x11, "sipush", 2, N;
    Ldc = 0x12, "ldc", 1, N;
    Iload = 0x15, "iload", 1, N;
    Fload = 0x17, "fload", 1, F;
    Aload = 0x19, "aload", 1, N;
    Iload0 = 0x1a, "iload_0", 0, N;
    Iload1 = 0x1b, "iload_1", 0, N;
    Iload2 = 0x1c, "iload_2", 0, N;
    Iload3 = 0x1d, "iload_3", 0, N;
    Fload0 = 0x22, "fload_0", 0, F;
    Fload1 = 0x23, "fload_1", 0, F;
    Fload2 = 0x24, "fload_2", 0, F;
    Fload3 = 0x25, "fload_3", 0, F;
    Aload0 = 0x2a, "aload_0", 0, N;
    Aload1 = 0x2b, "aload_1", 0, N;
    Aload2 = 0x2c, "aload_2", 0, N;
    Aload3 = 0x2d, "aload_3", 0, N;
    Iaload = 0x2e, "iaload", 0, A;
    Faload = 0x30, "faload", 0, A;
    Aaload = 0x32, "aaload", 0, A;
    Baload = 0x33, "baload", 0, A;
    Caload = 0x34, "caload", 0, A;
    Saload = 0x35, "saload", 0, A;
    Istore = 0x36, "istore", 1, N;
    Fstore = 0x38, "fstore", 1, F;
    Astore = 0x3a, "astore", 1, N;
    Istore0 = 0x3b, "istore_0", 0, N;
    Istore1 = 0x3c, "istore_1", 0, N;
    Istore2 = 0x3d, "istore_2", 0, N;
    Istore3 = 0x3e, "istore_3", 0, N;
    Fstore0 = 0x43, "fstore_0", 0, F;
    Fstore1 = 0x44, "fstore_1", 0, F;
    Fstore2 = 0x45, "fstore_2", 0, F;
    Fstore3 = 0x46, "fstore_3", 0, F;
    Astore0 = 0x4b, "astore_0", 0, N;
    Astore1 = 0x4c, "astore_1", 0, N;
    Astore2 = 0x4d, "astore_2", 0, N;
    Astore3 = 0x4e, "astore_3", 0, N;
    Iastore = 0x4f, "iastore", 0, A;
    Fastore = 0x51, "fastore", 0, A;
    Aastore = 0x53, "aastore", 0, A;
    Bastore = 0x54, "bastore", 0, A;
    Castore = 0x55, "castore", 0, A;
    Sastore = 0x56, "sastore", 0, A;
    Pop = 0x57, "pop", 0, N;
    Pop2 = 0x58, "pop2", 0, N;
    Dup = 0x59, "dup", 0, N;
    DupX1 = 0x5a, "dup_x1", 0, N;
    Dup2 = 0x5c, "dup2", 0, N;
    Swap = 0x5f, "swap", 0, N;
    Iadd = 0x60, "iadd", 0, N;
    Fadd = 0x62, "fadd", 0, F;
    Isub = 0x64, "isub", 0, N;
    Fsub = 0x66, "fsub", 0, F;
    Imul = 0x68, "imul", 0, N;
    Fmul = 0x6a, "fmul", 0, F;
    Idiv = 0x6c, "idiv", 0, N;
    Fdiv = 0x6e, "fdiv", 0, F;
    Irem = 0x70, "irem", 0, N;
    Frem = 0x72, "frem", 0, F;
    Ineg = 0x74, "ineg", 0, N;
    Fneg = 0x76, "fneg", 0, F;
    Ishl = 0x78, "ishl", 0, N;
    Ishr = 0x7a, "ishr", 0, N;
    Iushr = 0x7c, "iushr", 0, N;
    Iand = 0x7e, "iand", 0, N;
    Ior = 0x80, "ior", 0, N;
    Ixor = 0x82, "ixor", 0, N;
    Iinc = 0x84, "iinc", 2, N;
    I2f = 0x86, "i2f", 0, F;
    F2i = 0x8b, "f2i", 0, F;
    I2b = 0x91, "i2b", 0, N;
    I2c = 0x92, "i2c", 0, N;
    I2s = 0x93, "i2s", 0, N;
    Fcmpl = 0x95, "fcmpl", 0, F;
    Fcmpg = 0x96, "fcmpg", 0, F;
    Ifeq = 0x99, "ifeq", 2, N;
    Ifne = 0x9a, "ifne", 2, N;
    Iflt = 0x9b, "iflt", 2, N;
    Ifge = 0x9c, "ifge", 2, N;
    Ifgt = 0x9d, "ifgt", 2, N;
    Ifle = 0x9e, "ifle", 2, N;
    IfIcmpeq = 0x9f, "if_icmpeq", 2, N;
    IfIcmpne = 0xa0, "if_icmpne", 2, N;
    IfIcmplt = 0xa1, "if_icmplt", 2, N;
    IfIcmpge = 0xa2, "if_icmpge", 2, N;
    IfIcmpgt = 0xa3, "if_icmpgt", 2, N;
    IfIcmple = 0xa4, "if_icmple", 2, N;
    IfAcmpeq = 0xa5, "if_acmpeq", 2, N;
    IfAcmpne = 0xa6, "if_acmpne", 2, N;
    Goto = 0xa7, "goto", 2, N;
    Tableswitch = 0xaa, "tableswitch", VAR, S;
    Lookupswitch = 0xab, "lookupswitch", VAR, S;
    Ireturn = 0xac, "ireturn", 0, N;
    Freturn = 0xae, "freturn", 0, F;
    Areturn = 0xb0, "areturn", 0, N;
    Return = 0xb1, "return", 0, N;
    Getstatic = 0xb2, "getstatic", 2, N;
    Putstatic = 0xb3, "putstatic", 2, N;
    Getfield = 0xb4, "getfield", 2, N;
    Putfield = 0xb5, "putfield", 2, N;
    Invokevirtual = 0xb6, "invokevirtual", 2, N;
    Invokespecial = 0xb7, "invokespecial", 2, N;
    Invokestatic = 0xb8, "invokestatic", 2, N;
    New = 0xbb, "new", 2, N;
    Newarray = 0xbc, "newarray", 1, A;
    Anewarray = 0xbd, "anewarray", 2, A;
    Arraylength = 0xbe, "arraylength", 0, A;
    Ifnull = 0xc6, "ifnull", 2, N;
    Ifnonnull = 0xc7, "ifnonnull", 2, N;
}

impl Opcode {
    /// Raw opcode byte.
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Local variable index encoded in the opcode itself (`iload_2` etc.).
    pub fn implicit_local(self) -> Option<u8> {
        use Opcode::*;
        match self {
            Iload0 | Fload0 | Aload0 | Istore0 | Fstore0 | Astore0 => Some(0),
            Iload1 | Fload1 | Aload1 | Istore1 | Fstore1 | Astore1 => Some(1),
            Iload2 | Fload2 | Aload2 | Istore2 | Fstore2 | Astore2 => Some(2),
            Iload3 | Fload3 | Aload3 | Istore3 | Fstore3 | Astore3 => Some(3),
            _ => None,
        }
    }

    /// Check if this opcode transfers control (branch, switch or return)
    pub fn is_branch(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            Ifeq | Ifne
                | Iflt
                | Ifge
                | Ifgt
                | Ifle
                | IfIcmpeq
                | IfIcmpne
                | IfIcmplt
                | IfIcmpge
                | IfIcmpgt
                | IfIcmple
                | IfAcmpeq
                | IfAcmpne
                | Goto
                | Ifnull
                | Ifnonnull
        )
    }

    /// Check if this opcode returns from the current method
    pub fn is_return(self) -> bool {
        matches!(
            self,
            Opcode::Ireturn | Opcode::Freturn | Opcode::Areturn | Opcode::Return
        )
    }

    /// Check if this opcode is a method invocation
    pub fn is_invoke(self) -> bool {
        matches!(
            self,
            Opcode::Invokevirtual | Opcode::Invokespecial | Opcode::Invokestatic
        )
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Opcode::from_byte(byte).ok_or(byte)
    }
}
