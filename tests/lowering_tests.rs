//! End-to-end lowering tests: source in, IR structure out

use geode::compiler::ir::{BasicBlock, Function, Instruction, IrType, Terminator};
use geode::compiler::{CompileOptions, Compiler, ModuleLowerer};
use geode::{CompiledUnit, Declaration, Error, Parser, Scanner, Statement};

fn compile(source: &str) -> CompiledUnit {
    compile_with(source, CompileOptions::default())
}

fn compile_with(source: &str, options: CompileOptions) -> CompiledUnit {
    Compiler::new(options)
        .compile_source(source)
        .expect("source should parse")
}

fn function<'a>(unit: &'a CompiledUnit, name: &str) -> &'a Function {
    unit.module
        .function(name)
        .unwrap_or_else(|| panic!("function {} missing:\n{}", name, unit.ir()))
}

fn block<'a>(func: &'a Function, name: &str) -> &'a BasicBlock {
    func.block_by_name(name)
        .unwrap_or_else(|| panic!("block {} missing in {}", name, func))
}

fn assert_all_sealed(func: &Function) {
    for block in &func.blocks {
        assert!(
            block.is_terminated(),
            "block {} has no terminator:\n{}",
            block.name,
            func
        );
    }
}

// ====================
// Loop lowering
// ====================

#[test]
fn test_loop_with_index_five() {
    let tokens = Scanner::new(
        "func count(int n) -> int {
            int total = 0;
            for int i = 0; i < n; i = i + 1 { total = total + i; }
            return total;
        }",
    )
    .scan_tokens()
    .unwrap();
    let mut program = Parser::new(tokens).parse().unwrap();

    let Declaration::Function(func) = &mut program.declarations[0] else {
        panic!("expected function");
    };
    let Statement::For(node) = &mut func.body[1] else {
        panic!("expected for loop");
    };
    node.index = 5;

    let mut lowerer = ModuleLowerer::new(CompileOptions::default());
    for decl in program.declarations {
        lowerer.accept(decl);
    }
    let unit = lowerer.finish();
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);

    let func = function(&unit, "count");
    let prefixed: Vec<&str> = func
        .blocks
        .iter()
        .map(|b| b.name.as_str())
        .filter(|name| name.starts_with("F5_"))
        .collect();
    assert_eq!(prefixed, vec!["F5_cond", "F5_body", "F5_step", "F5_end"]);

    match &block(func, "F5_cond").terminator {
        Some(Terminator::CondBr {
            cond,
            then_label,
            else_label,
        }) => {
            assert_eq!(cond.ty(), &IrType::I1);
            assert_eq!(then_label, "F5_body");
            assert_eq!(else_label, "F5_end");
        }
        other => panic!("expected conditional branch, got {:?}", other),
    }
    assert_eq!(block(func, "F5_body").successors(), vec!["F5_step"]);
    assert_eq!(block(func, "F5_step").successors(), vec!["F5_cond"]);
    assert_all_sealed(func);
}

#[test]
fn test_entry_branches_into_cond() {
    let unit = compile("func f() -> void { for int i = 0; i < 3; i = i + 1 { } }");
    let func = function(&unit, "f");
    assert_eq!(block(func, "entry").successors(), vec!["F0_cond"]);
    // The loop leaves its end block active, which falls off the function
    assert_eq!(
        block(func, "F0_end").terminator,
        Some(Terminator::Ret(None))
    );
}

#[test]
fn test_cond_has_single_conditional_terminator() {
    let unit = compile(
        "func f(int n) -> int {
            for int i = 0; i < n && i != 7; i = i + 1 { }
            return 0;
        }",
    );
    let func = function(&unit, "f");
    let cond = block(func, "F0_cond");
    assert!(matches!(cond.terminator, Some(Terminator::CondBr { .. })));
    let ir = func.to_string();
    let cond_text = ir
        .split("F0_cond:")
        .nth(1)
        .and_then(|rest| rest.split("\n\n").next())
        .unwrap();
    assert_eq!(cond_text.matches("br ").count(), 1, "{}", cond_text);
}

#[test]
fn test_body_ending_in_return_has_no_edge_to_step() {
    let unit = compile(
        "func first(int n) -> int {
            for int i = 0; i < n; i = i + 1 { return i; }
            return -1;
        }",
    );
    let func = function(&unit, "first");
    let body = block(func, "F0_body");
    assert!(matches!(body.terminator, Some(Terminator::Ret(Some(_)))));
    assert!(body.successors().is_empty());
    // The step block still exists and still loops back
    assert_eq!(block(func, "F0_step").successors(), vec!["F0_cond"]);
    assert_all_sealed(func);
}

#[test]
fn test_nested_if_in_loop_body() {
    let unit = compile(
        "extern func puts(byte*) -> i32;
        func f(int n) -> void {
            for int i = 0; i < n; i = i + 1 {
                if i == 2 { puts(\"two\"); } else { puts(\"other\"); }
            }
        }",
    );
    let func = function(&unit, "f");

    // The if's condition is evaluated in the loop body, which branches on it
    assert_eq!(
        block(func, "F0_body").successors(),
        vec!["I1_then", "I1_else"]
    );
    assert_eq!(block(func, "I1_end").successors(), vec!["F0_step"]);
    assert_all_sealed(func);
    assert_eq!(unit.module.globals.len(), 2);
}

#[test]
fn test_nested_loops_get_distinct_prefixes() {
    let unit = compile(
        "func grid(int n) -> int {
            int cells = 0;
            for int i = 0; i < n; i = i + 1 {
                for int j = 0; j < n; j = j + 1 { cells = cells + 1; }
            }
            return cells;
        }",
    );
    let func = function(&unit, "grid");
    assert_eq!(block(func, "F0_body").successors(), vec!["F1_cond"]);
    assert_eq!(block(func, "F1_end").successors(), vec!["F0_step"]);
    assert_all_sealed(func);
}

#[test]
fn test_hex_loop_index() {
    let mut source = String::from("func f() -> void {\n");
    for _ in 0..11 {
        source.push_str("for int i = 0; i < 1; i = i + 1 { }\n");
    }
    source.push('}');
    let unit = compile(&source);
    let func = function(&unit, "f");
    assert!(func.block_by_name("FA_cond").is_some());
    assert!(func.block_by_name("F10_cond").is_none());
}

#[test]
fn test_loop_variable_is_scoped_to_loop() {
    let unit = compile(
        "func f() -> int {
            for int i = 0; i < 3; i = i + 1 { }
            return i;
        }",
    );
    assert_eq!(unit.diagnostics.len(), 1);
    assert!(matches!(
        unit.diagnostics[0].error,
        Error::UnboundIdentifier { ref name, .. } if name == "i"
    ));
}

#[test]
fn test_loop_variable_can_be_redeclared_after_loop() {
    let unit = compile(
        "func f() -> int {
            for int i = 0; i < 3; i = i + 1 { }
            for int i = 0; i < 3; i = i + 1 { }
            int i = 9;
            return i;
        }",
    );
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
}

#[test]
fn test_loop_metadata_on_back_edge() {
    let options = CompileOptions {
        loop_metadata: true,
        emit_ident: false,
        ..Default::default()
    };
    let unit = compile_with(
        "func f() -> void { for int i = 0; i < 3; i = i + 1 { } }",
        options,
    );
    let ir = unit.ir();
    assert!(ir.contains("br label %F0_cond, !llvm.loop !0"), "{}", ir);
    assert!(
        ir.contains("!0 = !{!0, !{!\"llvm.loop.mustprogress\"}}"),
        "{}",
        ir
    );
}

#[test]
fn test_slice_loop_condition_is_a_cast_error() {
    let unit = compile(
        "func f(int[] xs) -> void {
            for int i = 0; xs; i = i + 1 { }
        }",
    );
    assert_eq!(unit.diagnostics.len(), 1);
    match &unit.diagnostics[0].error {
        Error::TypeCast { to, context, .. } => {
            assert_eq!(to, "i1");
            assert_eq!(context, "for loop condition");
        }
        other => panic!("expected cast error, got {:?}", other),
    }
}

// ====================
// Functions and statements
// ====================

#[test]
fn test_parameters_are_spilled_to_entry_allocas() {
    let unit = compile("func add(int a, int b) -> int { return a + b; }");
    let func = function(&unit, "add");
    let entry = block(func, "entry");
    assert!(matches!(
        &entry.instructions[0],
        Instruction::Alloca { dst, .. } if dst == "a.addr"
    ));
    assert!(matches!(
        &entry.instructions[1],
        Instruction::Alloca { dst, .. } if dst == "b.addr"
    ));
    let ir = func.to_string();
    assert!(ir.contains("define i64 @add(i64 %a.arg, i64 %b.arg) {"), "{}", ir);
    assert!(ir.contains("store i64 %a.arg, i64* %a.addr"), "{}", ir);
}

/// Every `%name = ...` in the function text, in order
fn definitions(func: &Function) -> Vec<String> {
    func.to_string()
        .lines()
        .filter_map(|line| {
            let line = line.trim_start();
            let rest = line.strip_prefix('%')?;
            let (name, _) = rest.split_once(" = ")?;
            Some(name.to_string())
        })
        .collect()
}

fn assert_unique_definitions(func: &Function) {
    let defs = definitions(func);
    let mut seen = std::collections::HashSet::new();
    for def in &defs {
        assert!(seen.insert(def), "%{} defined twice:\n{}", def, func);
    }
}

#[test]
fn test_local_named_t_does_not_clash_with_temporaries() {
    let unit = compile("func f() -> int { int t = 5; return t + 1; }");
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    let func = function(&unit, "f");
    assert_unique_definitions(func);
    let defs = definitions(func);
    assert!(defs.contains(&"t.0".to_string()), "{:?}", defs);
    assert!(defs.iter().filter(|d| d.starts_with("t.")).count() >= 3, "{:?}", defs);
}

#[test]
fn test_locals_and_temporaries_share_suffixes() {
    let unit = compile(
        "func f(int t) -> int {
            int t1 = t * 2;
            for int t = 0; t < 3; t = t + 1 { int t0 = t; t1 = t1 + t0; }
            return t1;
        }",
    );
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    assert_unique_definitions(function(&unit, "f"));
}

#[test]
fn test_parameter_named_like_a_label() {
    let unit = compile(
        "func f(int entry, int F0_cond, int dead0) -> int {
            for int i = 0; i < entry; i = i + 1 { F0_cond = F0_cond + i; }
            return F0_cond + dead0;
        }",
    );
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    let func = function(&unit, "f");
    let ir = func.to_string();
    assert!(
        ir.contains("define i64 @f(i64 %entry.arg, i64 %F0_cond.arg, i64 %dead0.arg) {"),
        "{}",
        ir
    );
    let labels: Vec<&str> = func.blocks.iter().map(|b| b.name.as_str()).collect();
    for param in &func.params {
        assert!(!labels.contains(&param.register().as_str()), "{}", ir);
    }
    assert_unique_definitions(func);
}

#[test]
fn test_missing_return_falls_back_to_zero() {
    let unit = compile("func f() -> int { int x = 1; }");
    let func = function(&unit, "f");
    assert_eq!(
        block(func, "entry").terminator.as_ref().map(|t| t.to_string()),
        Some("ret i64 0".to_string())
    );
}

#[test]
fn test_code_after_return_goes_to_dead_block() {
    let unit = compile("func f() -> int { return 1; int y = 2; }");
    let func = function(&unit, "f");
    assert_eq!(
        block(func, "entry").terminator.as_ref().map(|t| t.to_string()),
        Some("ret i64 1".to_string())
    );
    assert!(func.block_by_name("dead0").is_some());
    assert_all_sealed(func);
}

#[test]
fn test_inferred_local_takes_initializer_type() {
    let unit = compile("func f() -> double { double? x = 1.5; return x; }");
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    let ir = unit.ir();
    assert!(ir.contains("%x.0 = alloca double"), "{}", ir);
}

#[test]
fn test_len_of_slice_reads_length_field() {
    let unit = compile("func size(byte[] data) -> int { return len(data); }");
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    let ir = unit.ir();
    assert!(ir.contains("extractvalue { i8*, i64 }"), "{}", ir);
    assert!(ir.contains(", 1"), "{}", ir);
}

#[test]
fn test_forward_call() {
    let unit = compile(
        "func main() -> int { return helper(2); }
        func helper(int x) -> int { return x * 2; }",
    );
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    assert!(unit.ir().contains("call i64 @helper(i64 2)"));
}

#[test]
fn test_extern_declaration_is_emitted() {
    let unit = compile(
        "extern func puts(byte*) -> i32;
        func main() -> int { puts(\"hi\"); return 0; }",
    );
    let ir = unit.ir();
    assert!(ir.contains("declare i32 @puts(i8*)"), "{}", ir);
    assert!(
        ir.contains("@.str.0 = private unnamed_addr constant [3 x i8] c\"hi\\00\""),
        "{}",
        ir
    );
}

#[test]
fn test_variadic_extern_call() {
    let unit = compile(
        "extern func printf(byte*, ...) -> i32;
        func main() -> int {
            float f = 2.5;
            printf(\"%d %f\\n\", 42, f);
            printf(\"plain\\n\");
            return 0;
        }",
    );
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    let ir = unit.ir();
    assert!(ir.contains("declare i32 @printf(i8*, ...)\n"), "{}", ir);
    assert_eq!(ir.matches("call i32 (i8*, ...) @printf(").count(), 2, "{}", ir);
    assert!(ir.contains(", i64 42, double %t."), "{}", ir);
    assert!(ir.contains("fpext float"), "{}", ir);
}

#[test]
fn test_variadic_call_needs_fixed_arguments() {
    let unit = compile(
        "extern func printf(byte*, ...) -> i32;
        func main() -> int { printf(); return 0; }",
    );
    assert!(matches!(
        unit.diagnostics[0].error,
        Error::ArityMismatch {
            expected: 1,
            got: 0,
            ..
        }
    ));
}

#[test]
fn test_void_value_is_not_a_variadic_argument() {
    let unit = compile(
        "extern func printf(byte*, ...) -> i32;
        extern func tick() -> void;
        func main() -> int { printf(\"x\", tick()); return 0; }",
    );
    assert!(matches!(
        unit.diagnostics[0].error,
        Error::TypeCast { .. }
    ));
}

// ====================
// Short-circuit logic
// ====================

fn calls_in(block: &BasicBlock) -> Vec<&str> {
    block
        .instructions
        .iter()
        .filter_map(|inst| match inst {
            Instruction::Call { callee, .. } => Some(callee.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_and_only_calls_right_operand_when_left_is_true() {
    let unit = compile(
        "func g() -> bool { return true; }
         func f(bool a) -> bool { return a && g(); }",
    );
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    let func = function(&unit, "f");

    let entry = block(func, "entry");
    assert!(calls_in(entry).is_empty(), "{}", func);
    assert_eq!(entry.successors(), vec!["L0_rhs", "L0_end"]);

    let rhs = block(func, "L0_rhs");
    assert_eq!(calls_in(rhs), vec!["g"]);
    assert_eq!(rhs.successors(), vec!["L0_end"]);

    match &block(func, "L0_end").instructions[0] {
        Instruction::Phi { ty, incoming, .. } => {
            assert_eq!(ty, &IrType::I1);
            assert_eq!(incoming[0].0.ident(), "false");
            assert_eq!(incoming[0].1, "entry");
            assert_eq!(incoming[1].1, "L0_rhs");
        }
        other => panic!("expected phi, got {}", other),
    }
    assert_all_sealed(func);
}

#[test]
fn test_or_skips_right_operand_when_left_is_true() {
    let unit = compile(
        "func g() -> bool { return false; }
         func f(bool a) -> bool { return a || g(); }",
    );
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    let func = function(&unit, "f");
    assert_eq!(block(func, "entry").successors(), vec!["L0_end", "L0_rhs"]);
    assert_eq!(calls_in(block(func, "L0_rhs")), vec!["g"]);
    let ir = func.to_string();
    assert!(ir.contains("phi i1 [ true, %entry ]"), "{}", ir);
    assert!(!ir.contains(" or i1"), "{}", ir);
}

#[test]
fn test_loop_condition_guards_index_with_and() {
    let unit = compile(
        "func count(int[] xs) -> int {
            int n = 0;
            for int i = 0; i < len(xs) && xs[i] != 0; i = i + 1 { n = n + 1; }
            return n;
        }",
    );
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    let func = function(&unit, "count");

    let cond = block(func, "F0_cond");
    assert_eq!(cond.successors(), vec!["L0_rhs", "L0_end"]);
    assert!(!cond
        .instructions
        .iter()
        .any(|inst| matches!(inst, Instruction::GetElementPtr { .. })));
    assert!(block(func, "L0_rhs")
        .instructions
        .iter()
        .any(|inst| matches!(inst, Instruction::GetElementPtr { .. })));

    // The loop branches from the block the condition finished in
    assert_eq!(block(func, "L0_end").successors(), vec!["F0_body", "F0_end"]);
    assert_eq!(block(func, "F0_step").successors(), vec!["F0_cond"]);
    assert_all_sealed(func);
    assert_unique_definitions(func);
}

#[test]
fn test_nested_logic_gets_distinct_blocks() {
    let unit = compile("func f(int a, int b) -> bool { return a > 0 && b > 0 || a == b; }");
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    let func = function(&unit, "f");
    for name in ["L0_rhs", "L0_end", "L1_rhs", "L1_end"] {
        block(func, name);
    }
    assert_all_sealed(func);
    assert_unique_definitions(func);
}

// ====================
// Error isolation
// ====================

#[test]
fn test_error_in_one_function_leaves_others() {
    let unit = compile(
        "func good() -> int { return 1; }
        func bad() -> int { return missing(1); }
        func also_good() -> int { return good(); }",
    );
    assert_eq!(unit.diagnostics.len(), 1);
    assert_eq!(unit.diagnostics[0].declaration, "bad");
    assert!(matches!(
        unit.diagnostics[0].error,
        Error::UnknownFunction { .. }
    ));
    assert!(unit.module.function("good").is_some());
    assert!(unit.module.function("also_good").is_some());
    assert!(unit.module.function("bad").is_none());
}

#[test]
fn test_arity_mismatch() {
    let unit = compile(
        "func two(int a, int b) -> int { return a; }
        func main() -> int { return two(1); }",
    );
    assert!(matches!(
        unit.diagnostics[0].error,
        Error::ArityMismatch {
            expected: 2,
            got: 1,
            ..
        }
    ));
}

#[test]
fn test_duplicate_function_keeps_first() {
    let unit = compile(
        "func f() -> int { return 1; }
        func f() -> int { return 2; }",
    );
    assert_eq!(unit.diagnostics.len(), 1);
    assert!(!unit.diagnostics[0].error.is_fatal());
    assert_eq!(
        unit.module
            .functions
            .iter()
            .filter(|f| f.name == "f")
            .count(),
        1
    );
    assert!(unit.ir().contains("ret i64 1"));
}

#[test]
fn test_parse_error_is_fatal_for_unit() {
    let err = Compiler::new(CompileOptions::default())
        .compile_source("func ok() -> int { return 1; } func broken(int a -> int { }")
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, Error::SyntaxError { .. }));
}

#[test]
fn test_module_header_and_ident() {
    let options = CompileOptions {
        source_filename: "demo.g".to_string(),
        target_triple: Some("x86_64-pc-linux-gnu".to_string()),
        ..Default::default()
    };
    let unit = compile_with("func main() -> int { return 0; }", options);
    let ir = unit.ir();
    assert!(ir.starts_with("; ModuleID = 'demo.g'\nsource_filename = \"demo.g\"\n"));
    assert!(ir.contains("target triple = \"x86_64-pc-linux-gnu\""));
    assert!(ir.contains("!llvm.ident = !{!0}"), "{}", ir);
    assert!(ir.contains(&format!("!0 = !{{!\"geode {}\"}}", geode::VERSION)));
}
