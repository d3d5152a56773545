use assert_cmd::Command;

pub fn simpledb_cmd() -> Command {
    let mut cmd = Command::cargo_bin("simpledb").unwrap();
    cmd.env_remove("SIMPLEDB_LOCATION");
    cmd.env_remove("RUST_LOG");
    cmd
}
