//! End-to-end scenarios driving the public `Orchestrator` API directly
//! against a real compiler toolchain (`cc`/`ar`), since this crate has no
//! CLI binary of its own to shell out to.

use std::fs;
use std::time::Duration;

use cbuild::Orchestrator;
use tempfile::TempDir;

fn write_math_c(dir: &std::path::Path) {
    fs::write(
        dir.join("math.c"),
        "int cbuild_test_add(int a, int b) { return a + b; }\n",
    )
    .unwrap();
}

fn write_main_c(dir: &std::path::Path) {
    fs::write(
        dir.join("main.c"),
        "int cbuild_test_add(int a, int b);\nint main(void) { return cbuild_test_add(1, 2) - 3; }\n",
    )
    .unwrap();
}

fn mtime(path: &std::path::Path) -> std::time::SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

#[test]
fn trivial_static_lib() {
    let tmp = TempDir::new().unwrap();
    write_math_c(tmp.path());

    let mut orch = Orchestrator::new();
    orch.settings_mut().output_dir = tmp.path().join("build");
    let math = orch.add_static_library("math");
    orch.target_add_source(math, &tmp.path().join("math.c").to_string_lossy());

    let code = orch.run_with_args(vec![]);
    assert_eq!(code, 0);

    let build = tmp.path().join("build");
    let lib_name = if cfg!(windows) { "math.lib" } else { "libmath.a" };
    assert!(build.join(lib_name).exists());
    assert!(build.join("obj_math").join("math.o").exists());
}

#[test]
fn exe_linking_a_lib() {
    let tmp = TempDir::new().unwrap();
    write_math_c(tmp.path());
    write_main_c(tmp.path());

    let mut orch = Orchestrator::new();
    orch.settings_mut().output_dir = tmp.path().join("build");
    let math = orch.add_static_library("math");
    orch.target_add_source(math, &tmp.path().join("math.c").to_string_lossy());

    let main = orch.add_executable("main");
    orch.target_add_source(main, &tmp.path().join("main.c").to_string_lossy());
    orch.link_target(main, math);

    assert_eq!(orch.run_with_args(vec![]), 0);

    let build = tmp.path().join("build");
    let lib_name = if cfg!(windows) { "math.lib" } else { "libmath.a" };
    let exe_name = if cfg!(windows) { "main.exe" } else { "main" };
    assert!(build.join(exe_name).exists());
    assert!(mtime(&build.join(exe_name)) >= mtime(&build.join(lib_name)));
}

#[test]
fn incremental_no_op_leaves_artifacts_untouched() {
    let tmp = TempDir::new().unwrap();
    write_math_c(tmp.path());
    write_main_c(tmp.path());

    let mut orch = Orchestrator::new();
    orch.settings_mut().output_dir = tmp.path().join("build");
    let math = orch.add_static_library("math");
    orch.target_add_source(math, &tmp.path().join("math.c").to_string_lossy());
    let main = orch.add_executable("main");
    orch.target_add_source(main, &tmp.path().join("main.c").to_string_lossy());
    orch.link_target(main, math);

    assert_eq!(orch.run_with_args(vec![]), 0);

    let build = tmp.path().join("build");
    let lib_name = if cfg!(windows) { "math.lib" } else { "libmath.a" };
    let exe_name = if cfg!(windows) { "main.exe" } else { "main" };
    let lib_mtime = mtime(&build.join(lib_name));
    let exe_mtime = mtime(&build.join(exe_name));
    let obj_mtime = mtime(&build.join("obj_math").join("math.o"));

    std::thread::sleep(Duration::from_millis(20));

    // A fresh Orchestrator re-registering the identical graph, since each
    // process invocation owns one handle; only filesystem state persists
    // across runs.
    let mut orch2 = Orchestrator::new();
    orch2.settings_mut().output_dir = tmp.path().join("build");
    let math2 = orch2.add_static_library("math");
    orch2.target_add_source(math2, &tmp.path().join("math.c").to_string_lossy());
    let main2 = orch2.add_executable("main");
    orch2.target_add_source(main2, &tmp.path().join("main.c").to_string_lossy());
    orch2.link_target(main2, math2);

    assert_eq!(orch2.run_with_args(vec![]), 0);

    assert_eq!(mtime(&build.join("obj_math").join("math.o")), obj_mtime);
    assert_eq!(mtime(&build.join(lib_name)), lib_mtime);
    assert_eq!(mtime(&build.join(exe_name)), exe_mtime);
}

#[test]
fn touching_a_source_forces_recompile_and_relink_of_dependents() {
    let tmp = TempDir::new().unwrap();
    write_math_c(tmp.path());
    write_main_c(tmp.path());

    let mut orch = Orchestrator::new();
    orch.settings_mut().output_dir = tmp.path().join("build");
    let math = orch.add_static_library("math");
    orch.target_add_source(math, &tmp.path().join("math.c").to_string_lossy());
    let main = orch.add_executable("main");
    orch.target_add_source(main, &tmp.path().join("main.c").to_string_lossy());
    orch.link_target(main, math);
    assert_eq!(orch.run_with_args(vec![]), 0);

    let build = tmp.path().join("build");
    let lib_name = if cfg!(windows) { "math.lib" } else { "libmath.a" };
    let exe_name = if cfg!(windows) { "main.exe" } else { "main" };
    let lib_mtime = mtime(&build.join(lib_name));
    let exe_mtime = mtime(&build.join(exe_name));

    std::thread::sleep(Duration::from_millis(1100));
    write_math_c(tmp.path());

    let mut orch2 = Orchestrator::new();
    orch2.settings_mut().output_dir = tmp.path().join("build");
    let math2 = orch2.add_static_library("math");
    orch2.target_add_source(math2, &tmp.path().join("math.c").to_string_lossy());
    let main2 = orch2.add_executable("main");
    orch2.target_add_source(main2, &tmp.path().join("main.c").to_string_lossy());
    orch2.link_target(main2, math2);
    assert_eq!(orch2.run_with_args(vec![]), 0);

    assert!(mtime(&build.join(lib_name)) > lib_mtime);
    assert!(mtime(&build.join(exe_name)) > exe_mtime);
    assert!(mtime(&build.join(exe_name)) >= mtime(&build.join(lib_name)));
}

#[test]
fn cycle_is_reported_and_produces_no_artifact() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.c"), "int a(void) { return 0; }\n").unwrap();
    fs::write(tmp.path().join("b.c"), "int b(void) { return 0; }\n").unwrap();

    let mut orch = Orchestrator::new();
    orch.settings_mut().output_dir = tmp.path().join("build");
    let a = orch.add_static_library("a");
    orch.target_add_source(a, &tmp.path().join("a.c").to_string_lossy());
    let b = orch.add_static_library("b");
    orch.target_add_source(b, &tmp.path().join("b.c").to_string_lossy());
    orch.link_target(a, b);
    orch.link_target(b, a);

    assert_ne!(orch.run_with_args(vec![]), 0);

    let build = tmp.path().join("build");
    let lib_name_a = if cfg!(windows) { "a.lib" } else { "liba.a" };
    assert!(!build.join(lib_name_a).exists());
}

#[test]
fn clean_removes_output_directory() {
    let tmp = TempDir::new().unwrap();
    write_math_c(tmp.path());

    let mut orch = Orchestrator::new();
    orch.settings_mut().output_dir = tmp.path().join("build");
    let math = orch.add_static_library("math");
    orch.target_add_source(math, &tmp.path().join("math.c").to_string_lossy());
    assert_eq!(orch.run_with_args(vec![]), 0);
    assert!(tmp.path().join("build").exists());

    assert_eq!(orch.run_with_args(vec!["clean".to_string()]), 0);
    assert!(!tmp.path().join("build").exists());
}

#[test]
fn selective_build_by_target_name_builds_only_that_closure() {
    let tmp = TempDir::new().unwrap();
    write_math_c(tmp.path());
    write_main_c(tmp.path());

    let mut orch = Orchestrator::new();
    orch.settings_mut().output_dir = tmp.path().join("build");
    let math = orch.add_static_library("math");
    orch.target_add_source(math, &tmp.path().join("math.c").to_string_lossy());
    let main = orch.add_executable("main");
    orch.target_add_source(main, &tmp.path().join("main.c").to_string_lossy());
    orch.link_target(main, math);

    assert_eq!(orch.run_with_args(vec!["math".to_string()]), 0);

    let build = tmp.path().join("build");
    let lib_name = if cfg!(windows) { "math.lib" } else { "libmath.a" };
    let exe_name = if cfg!(windows) { "main.exe" } else { "main" };
    assert!(build.join(lib_name).exists());
    assert!(!build.join(exe_name).exists());
}
