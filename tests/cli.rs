use std::error::Error;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;
use predicates::prelude::*;

type TestResult = Result<(), Box<dyn Error>>;

fn chtml() -> Command {
    let mut cmd = Command::new(get_cargo_bin("chtml"));
    cmd.env("NO_COLOR", "1").env_remove("CHTML_LOG");
    cmd
}

#[test]
fn transpiles_stdin_to_stdout() {
    chtml()
        .args(["-c", "", "-b"])
        .write_stdin("Hello <?= name ?>!\n")
        .assert()
        .success()
        .stdout(
            "#include <stdio.h>\n#define print(x) fputs(x, stdout)\n\n\
             \nprint(\"Hello \");\nprint( name );\nprint(\"!\\n\");\n",
        );
}

#[test]
fn dash_selects_standard_streams() {
    chtml()
        .args(["-c", "", "-b", "-p", "emit", "-f", "emitf", "-", "-"])
        .write_stdin("<?% \"%d\", n ?>\n")
        .assert()
        .success()
        .stdout("emitf( \"%d\", n );");
}

#[test]
fn default_header_is_stamped() {
    chtml()
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("/*\n *\tGenerated by chtml (do not edit)\n *\t"));
}

#[test]
fn wrapper_and_content_type() {
    chtml()
        .args(["--main", "--html", "-c", "page", "-a", "#include \"app.h\"", "-z", "/* end */"])
        .write_stdin("<p>hi</p>\n")
        .assert()
        .success()
        .stdout(
            "/*\npage\n*/\n#include <stdio.h>\n#define print(x) fputs(x, stdout)\n\n\
             #include \"app.h\"\nint main(void) {\n\
             print(\"Content-Type: text/html; charset=utf-8\\n\\n\");\n\
             \nprint(\"<p>hi</p>\\n\");\n\
             \nreturn 0; } /* end main function */\n/* end */\n",
        );
}

#[test]
fn reads_and_writes_files() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("page.chtml");
    let output = tmp.path().join("page.c");
    std::fs::write(&input, "<?\nint x = 1;\n?>\n<b>x</b>\n")?;

    chtml().args(["-c", "", "-p", "print", "-f", "printf"]).arg(&input).arg(&output).assert().success();

    assert_eq!(
        std::fs::read_to_string(&output)?,
        "/* BEGIN C (line 1) */\nint x = 1;\n/* END C (line 3) */\nprint(\"<b>x</b>\\n\");\n"
    );
    Ok(())
}

#[test]
fn missing_input_file_fails() -> TestResult {
    let tmp = tempfile::tempdir()?;
    chtml()
        .arg(tmp.path().join("nope.chtml"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("chtml error: unable to open"));
    Ok(())
}

#[test]
fn scan_error_reports_line_and_keeps_partial_output() {
    chtml()
        .args(["-c", "", "-b", "-p", "print", "-f", "printf"])
        .write_stdin("<p>a</p>\n<? s = \"oops\n")
        .assert()
        .failure()
        .code(1)
        .stdout("\nprint(\"<p>a</p>\\n\");\n s = \"oops")
        .stderr(predicate::str::contains("chtml error: ").and(predicate::str::contains("(line: 2)")));
}

#[test]
fn stray_angle_bracket_is_rejected() {
    chtml()
        .args(["-c", ""])
        .write_stdin("a < b\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("'&lt;'").and(predicate::str::contains("(line: 1)")));
}

#[test]
fn unclosed_code_block_only_warns() {
    chtml()
        .args(["-c", "", "-b", "-p", "print", "-f", "printf"])
        .write_stdin("<?\nint x;\n")
        .assert()
        .success()
        .stdout("int x;\n")
        .stderr(predicate::str::contains("input ended inside host code"));
}

#[test]
fn print_override_must_be_identifier() {
    chtml()
        .args(["-p", "2print"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid identifier '2print'"));
}

#[test]
fn short_version_flag() {
    chtml()
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("chtml "));
}

#[test]
fn zero_max_line_is_rejected() {
    chtml()
        .args(["--max-line", "0"])
        .write_stdin("<p>hello</p>\n")
        .assert()
        .failure()
        .code(2)
        .stdout("");
}
