use oavg_core::GeneratedFile;

const SUPPORT: &str = include_str!("../../templates/support.ts");

/// The fixed `support.ts` module every operation file imports from.
pub fn emit_support() -> GeneratedFile {
    GeneratedFile {
        path: "support.ts".to_string(),
        content: SUPPORT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use oavg_core::resolve::is_reserved;

    use super::*;

    fn exports() -> Vec<&'static str> {
        SUPPORT
            .lines()
            .filter_map(|line| {
                let rest = line.strip_prefix("export ")?;
                let rest = rest.strip_prefix("async ").unwrap_or(rest);
                let rest = ["type ", "interface ", "function ", "const "]
                    .iter()
                    .find_map(|kw| rest.strip_prefix(kw))?;
                let end = rest
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
                    .unwrap_or(rest.len());
                Some(&rest[..end])
            })
            .collect()
    }

    #[test]
    fn every_export_is_reserved() {
        let exports = exports();
        for name in ["bindOperations", "hasParsed", "parseBody", "ManualSuccess", "ForcedSuccess"] {
            assert!(exports.contains(&name), "`{name}` is not exported");
        }
        for name in exports {
            assert!(is_reserved(name), "`{name}` must be reserved");
        }
    }
}
