// Scoped module loading.
//
// A LoadedModule owns the decoded program for exactly one run and
// releases it when dropped, so nothing a snippet defines outlives the
// invocation that loaded it.

use scrap_compiler::image::{self, Program};
use scrap_compiler::trace::trace;

#[derive(Debug)]
pub struct LoadedModule {
    program: Program,
}

impl LoadedModule {
    pub fn from_image(bytes: &[u8]) -> Result<LoadedModule, String> {
        trace(&format!(
            "scrap-runner: loading module image ({} bytes)",
            bytes.len()
        ));
        let program = image::decode_module(bytes)?;
        Ok(LoadedModule { program })
    }

    pub fn program(&self) -> &Program {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrap_compiler::options::CompileOptions;

    #[test]
    fn test_load_compiled_image() {
        let compiled = scrap_compiler::compile(
            r#"public class W { public static void Main(string[] m) { print(m[0]); } }"#,
            &CompileOptions::default(),
        )
        .unwrap();
        let module = LoadedModule::from_image(compiled.image()).unwrap();
        assert_eq!(module.program().classes.len(), 1);
    }

    #[test]
    fn test_load_rejects_non_image_bytes() {
        let err = LoadedModule::from_image(b"junk").unwrap_err();
        assert!(err.contains("failed to decode"));
    }
}
