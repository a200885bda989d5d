use crate::ast::{Parameter, Statement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConvention {
    Cdecl,
    Pascal,
    Stdcall,
}

/// `EXTERNAL "library" ...` binding. Recorded but never callable here.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalBinding {
    pub library: String,
    pub calling_convention: Option<CallingConvention>,
    pub ordinal: Option<i64>,
    pub persistent: bool,
    pub thread_safe: bool,
}

/// Procedure definition.
///
/// `DEFINE ... PARAMETER` statements found in the body are moved into
/// `parameters`, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Procedure {
    /// Lower-cased name
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub body: Vec<Statement>,
    pub is_private: bool,
    pub external: Option<ExternalBinding>,
    pub in_super: bool,
    /// Header terminated by `.` with no body
    pub prototype_only: bool,
}
