use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use pretty_assertions::assert_eq;

struct Run {
    stdout: String,
    stderr: String,
    status: i32,
}

/// Feed `input` to the shell on a pipe, with `dir` as cwd and `$HOME`.
fn run_in(dir: &Path, input: &str) -> Run {
    let mut child = Command::new(env!("CARGO_BIN_EXE_minishell"))
        .current_dir(dir)
        .env("HOME", dir)
        .env_remove("MINISHELL_RC")
        .env_remove("MINISHELL_LOG")
        .env_remove("UNDEFINED_VAR")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn minishell");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(input.as_bytes())
        .expect("write script");
    let output = child.wait_with_output().expect("wait for minishell");
    Run {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        status: output.status.code().unwrap_or(-1),
    }
}

fn run(input: &str) -> Run {
    let dir = tempfile::tempdir().unwrap();
    run_in(dir.path(), input)
}

#[test]
fn echo_runs_in_process() {
    let r = run("echo hello\n");
    assert_eq!(r.stdout, "hello\n");
    assert_eq!(r.stderr, "");
    assert_eq!(r.status, 0);
}

#[test]
fn undefined_variable_expands_to_nothing() {
    let r = run("echo $UNDEFINED_VAR end\n");
    assert_eq!(r.stdout, "end\n");
}

#[test]
fn failing_stage_does_not_stop_pipeline() {
    let r = run("cat nonexistent_file | wc -l\necho $?\n");
    let lines: Vec<&str> = r.stdout.lines().map(str::trim).collect();
    assert_eq!(lines, vec!["0", "0"]);
    assert!(r.stderr.contains("No such file or directory"), "stderr: {}", r.stderr);
}

#[test]
fn exit_sets_process_status() {
    let r = run("exit 42\necho never\n");
    assert_eq!(r.status, 42);
    assert_eq!(r.stdout, "");
}

#[test]
fn unclosed_quote_is_rejected() {
    let r = run("echo \"unterminated\necho $?\n");
    assert_eq!(r.stdout, "2\n");
    assert!(r.stderr.contains("minishell: syntax error quote not closed"));
}

#[test]
fn syntax_errors_report_token() {
    let r = run("| ls\necho $?\nls >\necho $?\n");
    assert_eq!(r.stdout, "2\n2\n");
    assert!(r.stderr.contains("syntax error near unexpected token `|'"));
    assert!(r.stderr.contains("syntax error near unexpected token `newline'"));
}

#[test]
fn redirections_create_and_read_files() {
    let dir = tempfile::tempdir().unwrap();
    let r = run_in(dir.path(), "echo one > out.txt\necho two >> out.txt\ncat < out.txt\n");
    assert_eq!(r.stdout, "one\ntwo\n");
    assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "one\ntwo\n");
}

#[test]
fn heredoc_feeds_stdin() {
    let r = run("export NAME=world\ncat << EOF\nhello $NAME\n'$NAME'\nEOF\ncat << 'EOF'\nhello $NAME\nEOF\n");
    assert_eq!(r.stdout, "hello world\n'world'\nhello $NAME\n");
}

#[test]
fn heredoc_at_end_of_input_warns() {
    let r = run("cat << END\nbody\n");
    assert_eq!(r.stdout, "body\n");
    assert!(r.stderr.contains("here-document delimited by end-of-file (wanted `END')"));
}

#[test]
fn exported_variables_reach_children() {
    let r = run("export FOO=bar\nenv | grep ^FOO=\nunset FOO\nenv | grep -c ^FOO=\n");
    assert_eq!(r.stdout, "FOO=bar\n0\n");
}

#[test]
fn command_not_found_is_127() {
    let r = run("no_such_command_minishell\necho $?\n");
    assert_eq!(r.stdout, "127\n");
    assert!(r.stderr.contains("minishell: no_such_command_minishell: command not found"));
}

#[test]
fn directory_as_command_is_126() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let r = run_in(dir.path(), "./sub\necho $?\n/\necho $?\n");
    assert_eq!(r.stdout, "126\n126\n");
    assert!(r.stderr.contains("./sub: Is a directory"));
}

#[test]
fn ambiguous_redirect_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let r = run_in(dir.path(), "export TWO='a b'\necho x > $TWO\necho $?\n");
    assert_eq!(r.stdout, "1\n");
    assert!(r.stderr.contains("minishell: $TWO: ambiguous redirect"));
}

#[test]
fn last_stage_status_wins() {
    let r = run("false | true\necho $?\ntrue | false\necho $?\n");
    assert_eq!(r.stdout, "0\n1\n");
}

#[test]
fn cd_changes_directory_for_later_commands() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let r = run_in(dir.path(), "cd sub\npwd\ncd\npwd\n");
    let sub = dir.path().join("sub").canonicalize().unwrap();
    let home = dir.path().canonicalize().unwrap();
    assert_eq!(r.stdout, format!("{}\n{}\n", sub.display(), home.display()));
}

#[test]
fn eof_exits_with_last_status() {
    let r = run("false\n");
    assert_eq!(r.status, 1);
}

#[test]
fn rc_file_seeds_environment() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".minishellrc"), "env.GREETING=hi there\n").unwrap();
    let r = run_in(dir.path(), "echo \"$GREETING\"\n");
    assert_eq!(r.stdout, "hi there\n");
}

#[test]
fn quoted_word_with_expansion_is_not_split() {
    let r = run("export A=\"1 2\"\necho \"x\"$A\necho $A'y'\n");
    assert_eq!(r.stdout, "x1 2\n1 2y\n");
}

#[test]
fn signal_deaths_are_reported() {
    let r = run(
        "sh -c 'kill -INT $$'\necho $?\n\
         sh -c 'kill -QUIT $$'\necho $?\n\
         sh -c 'kill -QUIT $$' | cat\necho $?\n",
    );
    assert_eq!(r.stdout, "130\n131\n0\n");
    let lines: Vec<&str> = r.stderr.lines().collect();
    assert_eq!(lines.len(), 2, "stderr: {:?}", r.stderr);
    assert_eq!(lines[0], "");
    assert!(lines[1] == "Quit" || lines[1] == "Quit (core dumped)", "stderr: {:?}", r.stderr);
}
