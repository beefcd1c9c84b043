//! Runs every bento script in tests/scripts against its expected output.

use std::fs;

use bento_lang::compiler::code::CompiledProgram;
use bento_lang::vm::VirtualMachine;

#[test]
fn test_scripts() {
    const DIR: &str = "./tests/scripts";
    let mut ran = 0;
    for entry in fs::read_dir(DIR).expect("could not list dir") {
        let path = entry.expect("could not read dir entry").path();
        if !path.extension().is_some_and(|ext| ext == "bento") {
            continue;
        }
        let input = fs::read_to_string(&path).expect("could not read file contents");
        let program = CompiledProgram::try_from(input.as_str())
            .unwrap_or_else(|err| panic!("{}: {}", path.display(), err));
        let mut vm = VirtualMachine::with_output(program, Vec::new());
        vm.run()
            .unwrap_or_else(|err| panic!("{}: {}", path.display(), err));
        let output = String::from_utf8(vm.into_output()).expect("output was not utf-8");

        let expected =
            fs::read_to_string(path.with_extension("txt")).expect("could not read expected output");
        assert_eq!(output, expected, "{}", path.display());
        ran += 1;
    }
    assert!(ran > 0, "no scripts found in {DIR}");
}
