//! Tests del kernel Python real.
//!
//! Requieren un `python3` en el PATH; si no existe, cada test termina sin
//! verificar nada.

use std::time::{Duration, Instant};

use seqc_core::model::Output;
use seqc_core::{Cell, CellEngine, Kernel, KernelError, ReportDocument, SeqcError};
use seqc_kernel::{interpreter_available, KernelSpec, PythonKernel, DEFAULT_PYTHON};

fn start(dir: &std::path::Path) -> Option<PythonKernel> {
    if !interpreter_available(DEFAULT_PYTHON) {
        eprintln!("python3 no disponible, se omite el test");
        return None;
    }
    Some(PythonKernel::start(&KernelSpec::new(DEFAULT_PYTHON, dir)).expect("kernel start"))
}

fn soon() -> Instant {
    Instant::now() + Duration::from_secs(30)
}

#[test]
fn namespace_is_shared_between_cells() {
    let dir = tempfile::tempdir().unwrap();
    let Some(mut kernel) = start(dir.path()) else { return };

    let first = kernel.execute(1, "x = 1+1", soon()).unwrap();
    assert!(first.outputs.is_empty());
    assert!(first.failure.is_none());

    let second = kernel.execute(2, "print(x)", soon()).unwrap();
    assert_eq!(second.outputs,
               vec![Output::Stream { name: "stdout".into(),
                                     text: "2\n".into() }]);
    kernel.shutdown().unwrap();
}

#[test]
fn last_expression_becomes_execute_result() {
    let dir = tempfile::tempdir().unwrap();
    let Some(mut kernel) = start(dir.path()) else { return };

    let reply = kernel.execute(1, "y = [1, 2]\ny + [3]", soon()).unwrap();
    match &reply.outputs[..] {
        [Output::ExecuteResult { data, .. }] => assert_eq!(data["text/plain"], "[1, 2, 3]"),
        other => panic!("unexpected outputs: {other:?}"),
    }

    // una asignación final no produce resultado
    let reply = kernel.execute(2, "z = 3", soon()).unwrap();
    assert!(reply.outputs.is_empty());
}

#[test]
fn raised_exception_is_reported_with_output_so_far() {
    let dir = tempfile::tempdir().unwrap();
    let Some(mut kernel) = start(dir.path()) else { return };

    let reply = kernel.execute(1, "print('before')\nraise ValueError('bad input')", soon()).unwrap();
    let failure = reply.failure.expect("failure");
    assert_eq!(failure.ename, "ValueError");
    assert_eq!(failure.evalue, "bad input");
    assert!(matches!(&reply.outputs[0], Output::Stream { name, .. } if name == "stdout"));
    assert!(matches!(&reply.outputs[1], Output::Error { traceback, .. } if !traceback.is_empty()));

    // la sesión sigue viva después de un error de celda
    let reply = kernel.execute(2, "print('after')", soon()).unwrap();
    assert!(reply.failure.is_none());
}

#[test]
fn syntax_error_is_a_cell_failure() {
    let dir = tempfile::tempdir().unwrap();
    let Some(mut kernel) = start(dir.path()) else { return };

    let reply = kernel.execute(1, "def broken(:\n    pass", soon()).unwrap();
    assert_eq!(reply.failure.unwrap().ename, "SyntaxError");
}

#[test]
fn working_directory_is_the_requested_one() {
    let dir = tempfile::tempdir().unwrap();
    let Some(mut kernel) = start(dir.path()) else { return };

    kernel.execute(1, "open('artifact.txt', 'w').write('ok')", soon()).unwrap();
    kernel.shutdown().unwrap();
    assert_eq!(std::fs::read_to_string(dir.path().join("artifact.txt")).unwrap(), "ok");
}

#[test]
fn deadline_kills_long_running_cell() {
    let dir = tempfile::tempdir().unwrap();
    let Some(mut kernel) = start(dir.path()) else { return };

    let started = Instant::now();
    let err = kernel.execute(1, "import time\ntime.sleep(60)", Instant::now() + Duration::from_secs(1))
                    .unwrap_err();
    assert!(matches!(err, KernelError::DeadlineExceeded), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!kernel.is_alive());
    assert!(matches!(kernel.execute(2, "1", soon()), Err(KernelError::Exited)));
}

#[test]
fn engine_with_python_kernel_runs_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let Some(kernel) = start(dir.path()) else { return };

    let mut doc = ReportDocument::new(vec![Cell::code("x = 1+1"), Cell::code("print(x)")]);
    let mut engine = CellEngine::new(kernel, Duration::from_secs(60));
    engine.execute(&mut doc).unwrap();
    assert_eq!(doc.code_cell(2).unwrap().text_output(), "2");

    let mut failing = ReportDocument::new(vec![Cell::code("a = 1"),
                                               Cell::code("1/0"),
                                               Cell::code("open('never.txt', 'w')")]);
    let err = engine.execute(&mut failing).unwrap_err();
    assert!(matches!(err, SeqcError::Execution { cell: 2, ref ename, .. } if ename == "ZeroDivisionError"));
    engine.shutdown().unwrap();
    assert!(!dir.path().join("never.txt").exists());
}

#[test]
fn shutdown_after_successful_cells_is_clean() {
    let dir = tempfile::tempdir().unwrap();
    let Some(mut kernel) = start(dir.path()) else { return };

    kernel.execute(1, "x = 1", soon()).unwrap();
    kernel.shutdown().unwrap();
    assert!(!kernel.is_alive());
    // una segunda llamada no hace nada
    kernel.shutdown().unwrap();
}

#[test]
fn drop_of_live_kernel_does_not_panic() {
    let dir = tempfile::tempdir().unwrap();
    let Some(mut kernel) = start(dir.path()) else { return };

    kernel.execute(1, "x = 1", soon()).unwrap();
    drop(kernel);
}

#[test]
fn writes_to_process_stdout_do_not_break_replies() {
    let dir = tempfile::tempdir().unwrap();
    let Some(mut kernel) = start(dir.path()) else { return };

    let reply = kernel.execute(1, "import os\nos.system('echo hi')", soon()).unwrap();
    assert!(reply.failure.is_none());

    let reply = kernel.execute(2, "import sys\nsys.__stdout__.write('noise\\n')\nprint('x')", soon()).unwrap();
    assert_eq!(reply.outputs,
               vec![Output::Stream { name: "stdout".into(),
                                     text: "x\n".into() }]);
    kernel.shutdown().unwrap();
}

#[test]
fn cells_read_eof_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let Some(mut kernel) = start(dir.path()) else { return };

    let reply = kernel.execute(1, "input()", soon()).unwrap();
    assert_eq!(reply.failure.unwrap().ename, "EOFError");

    // el request siguiente no fue consumido por la celda
    let reply = kernel.execute(2, "print('still here')", soon()).unwrap();
    assert!(reply.failure.is_none());
    kernel.shutdown().unwrap();
}

#[test]
fn corrupted_reply_kills_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let Some(mut kernel) = start(dir.path()) else { return };

    // escribe una línea basura en el canal de respuestas del driver
    let forge = ["import gc, io",
                 "for f in gc.get_objects():",
                 "    if isinstance(f, io.TextIOWrapper) and not f.closed and f.mode == 'w' and f.fileno() > 2:",
                 "        f.write('garbage\\n'); f.flush()"].join("\n");
    let err = kernel.execute(1, &forge, soon()).unwrap_err();
    assert!(matches!(err, KernelError::Protocol(_)), "got {err:?}");
    assert!(!kernel.is_alive());
    // sin respuestas viejas: la sesión ya no responde
    assert!(matches!(kernel.execute(2, "print('x')", soon()), Err(KernelError::Exited)));
}
