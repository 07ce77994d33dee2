//! Runtime prelude.
//!
//! Declarations every unit begins with: the fat string type, the
//! conservative collector's entry points, and the globals the entry
//! function fills from its arguments. `GC_malloc` returns
//! zero-initialized storage, which is why declarations without an
//! initializer emit no store.

use crate::context::Cx;

pub fn emit_prelude(cx: &mut Cx) {
    cx.hoist("%str = type { i64, i8* }");
    cx.hoist("declare void @GC_init()");
    cx.hoist("declare i8* @GC_malloc(i64)");
    cx.hoist("@sk.argc = global i32 0");
    cx.hoist("@sk.argv = global i8** null");
}
