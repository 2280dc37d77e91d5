//! Script bundle prelude.
//!
//! The script bundle declares strict mode exactly once, at the top. Leading
//! directives in fragments and in the runtime initializer are removed.

use std::sync::Arc;

use crate::error::Error;
use crate::unit::Initializer;

/// Directive emitted at the top of every script bundle.
pub const USE_STRICT: &str = "'use strict';";

/// Strip a leading `"use strict"` or `'use strict'` directive, together with
/// any whitespace before it and an optional trailing semicolon.
pub fn strip_leading_use_strict(code: &[u8]) -> &[u8] {
    let start = code
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(code.len());
    let rest = &code[start..];

    for directive in [&b"\"use strict\""[..], &b"'use strict'"[..]] {
        if let Some(after) = rest.strip_prefix(directive) {
            return after.strip_prefix(b";").unwrap_or(after);
        }
    }
    code
}

/// Build the script bundle initializer: the strict-mode directive followed by
/// the runtime initializer's output, re-evaluated on every call.
pub fn prelude(runtime: Option<Initializer>) -> Initializer {
    Arc::new(move || {
        let mut out = USE_STRICT.to_string();
        if let Some(runtime) = &runtime {
            let code = runtime().map_err(|e| Error::Initializer(format!("runtime script: {e}")))?;
            out.push_str(&String::from_utf8_lossy(strip_leading_use_strict(
                code.as_bytes(),
            )));
        }
        Ok(out)
    })
}
