//! Mila 编译器端到端测试
//!
//! 检查打印出的文本 IR，并通过 milac 可执行文件走一遍完整流程

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use mila::{Compiler, CompilerOptions};

const GCD: &str = "program gcd;

function gcdi(a: integer; b: integer): integer;
var tmp: integer;
begin
    while b <> 0 do
    begin
        tmp := b;
        b := a mod b;
        a := tmp;
    end;
    gcdi := a;
end;

begin
    writeln(gcdi(27 * 2, 27 * 3));
end.
";

fn milac() -> Command {
    Command::new(env!("CARGO_BIN_EXE_milac"))
}

#[test]
fn test_printed_module_layout() {
    let ir = Compiler::new().compile_to_string(GCD).unwrap();

    assert!(ir.starts_with("; ModuleID = 'gcd'\nsource_filename = \"gcd\"\n"));
    assert!(ir.contains("declare i32 @writeln(i32)\n"));
    assert!(ir.contains("declare i32 @write(i8*)\n"));
    assert!(ir.contains("declare i32 @readln(i32*)\n"));
    assert!(ir.contains("define i32 @inc(i32* %arg.x) {\n"));
    assert!(ir.contains("define i32 @dec(i32* %arg.x) {\n"));
    assert!(ir.contains("define i32 @gcdi(i32 %arg.a, i32 %arg.b) {\n"));
    assert!(ir.contains("define i32 @main() {\n"));

    let gcdi = ir.find("@gcdi(").unwrap();
    let main = ir.find("define i32 @main").unwrap();
    assert!(gcdi < main);
}

#[test]
fn test_printed_function_body() {
    let source = "program p;
        function sign(n: integer): integer;
        begin
            if n < 0 then sign := -1 else sign := 1
        end;
        begin end.";
    let ir = Compiler::new().compile_to_string(source).unwrap();

    let expected = "define i32 @sign(i32 %arg.n) {
entry:
  %sign.addr.0 = alloca i32
  %n.addr.1 = alloca i32
  store i32 %arg.n, i32* %n.addr.1
  %tmp.2 = load i32, i32* %n.addr.1
  %tmp.3 = icmp slt i32 %tmp.2, 0
  br i1 %tmp.3, label %then.0, label %else.1

then.0:
  %tmp.4 = sub i32 0, 1
  store i32 %tmp.4, i32* %sign.addr.0
  br label %cont.2

else.1:
  store i32 1, i32* %sign.addr.0
  br label %cont.2

cont.2:
  %tmp.5 = load i32, i32* %sign.addr.0
  ret i32 %tmp.5
}
";
    assert!(ir.contains(expected), "unexpected IR:\n{}", ir);
}

#[test]
fn test_string_constant_is_printed() {
    let ir = Compiler::new()
        .compile_to_string("program p; begin write('Hello, Mila') end.")
        .unwrap();
    assert!(ir.contains("@.str.0 = private unnamed_addr constant [12 x i8] c\"Hello, Mila\\00\", align 1"));
    assert!(ir.contains("getelementptr inbounds [12 x i8], [12 x i8]* @.str.0, i32 0, i32 0"));
    assert!(ir.contains("call i32 @write(i8* %tmp.0)"));
}

#[test]
fn test_compiler_options() {
    let compiler = Compiler::with_options(CompilerOptions {
        target_triple: Some("x86_64-pc-linux-gnu".to_string()),
        module_name: Some("renamed".to_string()),
    });
    let ir = compiler.compile_to_string(GCD).unwrap();
    assert!(ir.starts_with("; ModuleID = 'renamed'\nsource_filename = \"renamed\"\ntarget triple = \"x86_64-pc-linux-gnu\"\n"));
}

#[test]
fn test_no_partial_output_on_error() {
    let compiler = Compiler::new();
    assert!(compiler.compile("program p; begin writeln(undefinedName) end.").is_err());
    assert!(compiler.compile("program p; begin writeln(1) end").is_ok());
    assert!(compiler.compile("program p; begin writeln(1 end.").is_err());
}

#[test]
fn test_lexer_error_position() {
    let err = Compiler::new().compile("program p;\nbegin # end.").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Lexer error at line 2, column 7: Unexpected character: '#'"
    );
}

#[test]
fn test_cli_stdin_to_stdout() {
    let mut child = milac()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start milac");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(GCD.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("define i32 @gcdi"));
    assert!(output.stderr.is_empty());
}

#[test]
fn test_cli_file_to_file() {
    let dir = std::env::temp_dir().join(format!("milac-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let input = dir.join("gcd.mila");
    let output = dir.join("gcd.ll");
    fs::write(&input, GCD).unwrap();

    let status = milac()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--module-name")
        .arg("cli")
        .status()
        .unwrap();
    assert!(status.success());

    let ir = fs::read_to_string(&output).unwrap();
    assert!(ir.starts_with("; ModuleID = 'cli'"));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_reports_compilation_error() {
    let mut child = milac()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start milac");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"program p; begin inc(3) end.")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Compilation error: Semantic error:"));
}

#[test]
fn test_cli_missing_input_file() {
    let output = milac().arg("/nonexistent/input.mila").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Compilation error: IO error: failed to read '/nonexistent/input.mila'"));
}

#[test]
fn test_cli_unwritable_output() {
    let dir = std::env::temp_dir().join(format!("milac-out-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let input = dir.join("p.mila");
    fs::write(&input, "program p; begin end.").unwrap();

    // 输出路径是一个目录，写入必然失败
    let output = milac().arg(&input).arg("-o").arg(&dir).output().unwrap();
    let _ = fs::remove_dir_all(&dir);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Compilation error: IO error: failed to write"));
}

#[test]
fn test_cli_version() {
    let output = milac().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Mila Compiler v"));
}
