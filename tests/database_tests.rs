//! Integration tests for the database catalog and its on-disk layout

use simpledb::domain::Entry;
use simpledb::error::SimpleDbError;
use simpledb::Database;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

#[test]
fn test_add_then_get_returns_empty_entry() {
    let temp = TempDir::new().unwrap();
    let db = Database::create(temp.path(), "db1").unwrap();

    for name in ["alpha", "with space", "dotted.name", "  padded  "] {
        db.add_named(name).unwrap();
        let entry = db.get(name).unwrap();
        assert_eq!(entry.name(), name.trim());
        assert!(entry.data().is_empty());
        assert!(entry.files().is_empty());
    }
    assert_eq!(db.size(), 4);
}

#[test]
fn test_adding_same_name_twice_keeps_one_entry() {
    let temp = TempDir::new().unwrap();
    let db = Database::create(temp.path(), "db1").unwrap();

    db.add_named("alpha").unwrap();
    let second = db.add(Entry::new(" alpha ").unwrap());

    assert!(matches!(second, Err(SimpleDbError::AlreadyExists(_))));
    assert_eq!(db.size(), 1);
    assert_eq!(db.entry_names(), vec!["alpha"]);
}

#[test]
fn test_upload_line_is_persisted() {
    let temp = TempDir::new().unwrap();
    let db = Database::create(temp.path(), "db1").unwrap();
    db.add_named("alpha").unwrap();
    let dat = temp.path().join("db1/alpha/alpha.dat");

    for (i, line) in ["first", "second", "", "first"].iter().enumerate() {
        let before = db.get("alpha").unwrap().data_count();
        db.upload_line("alpha", line).unwrap();

        assert_eq!(db.get("alpha").unwrap().data_count(), before + 1);
        let on_disk = read_lines(&dat);
        assert_eq!(on_disk.len(), i + 1);
        assert_eq!(on_disk.last().unwrap(), line);
    }
}

#[test]
fn test_remove_and_clear_data_rewrite_file() {
    let temp = TempDir::new().unwrap();
    let db = Database::create(temp.path(), "db1").unwrap();
    db.add_named("alpha").unwrap();
    let dat = temp.path().join("db1/alpha/alpha.dat");

    db.upload_data("alpha", ["a", "b", "c"]).unwrap();
    db.remove_data("alpha", 1).unwrap();
    assert_eq!(read_lines(&dat), vec!["a", "c"]);

    assert!(matches!(
        db.remove_data("alpha", 2),
        Err(SimpleDbError::NotFound(_))
    ));
    assert_eq!(read_lines(&dat), vec!["a", "c"]);

    db.clear_data("alpha").unwrap();
    assert_eq!(fs::read_to_string(&dat).unwrap(), "");
}

#[test]
fn test_remove_file_index_split() {
    let temp = TempDir::new().unwrap();
    let db = Database::create(temp.path(), "db1").unwrap();
    let local = temp.path().join("local.txt");
    fs::write(&local, "l").unwrap();

    let entry = Entry::new("alpha").unwrap().with_files([
        local.to_str().unwrap(),
        "/missing/r0.txt",
        "/missing/r1.txt",
    ]);
    db.add(entry).unwrap();

    let entry = db.get("alpha").unwrap();
    assert_eq!(entry.local_files(), ["local.txt"]);
    assert_eq!(entry.remote_files(), ["/missing/r0.txt", "/missing/r1.txt"]);

    // out of range: nothing changes
    assert!(db.remove_file("alpha", 3).is_err());
    assert_eq!(db.get("alpha").unwrap().files_count(), 3);

    // index >= local length hits the remote list
    db.remove_file("alpha", 1).unwrap();
    let entry = db.get("alpha").unwrap();
    assert_eq!(entry.local_files(), ["local.txt"]);
    assert_eq!(entry.remote_files(), ["/missing/r1.txt"]);

    // index < local length hits the local list and the file on disk
    db.remove_file("alpha", 0).unwrap();
    let entry = db.get("alpha").unwrap();
    assert!(entry.local_files().is_empty());
    assert_eq!(entry.remote_files(), ["/missing/r1.txt"]);
    assert!(!temp.path().join("db1/alpha/local.txt").exists());
}

#[test]
fn test_reopen_round_trip() {
    let temp = TempDir::new().unwrap();
    {
        let db = Database::create(temp.path(), "db1").unwrap();
        let entry = Entry::new("foo").unwrap().with_data(["a", "b"]).unwrap();
        db.add(entry).unwrap();
    }

    let db = Database::connect(temp.path(), "db1").unwrap();
    assert_eq!(db.name(), "db1");
    assert_eq!(db.location(), temp.path());
    assert_eq!(db.get("foo").unwrap().data(), ["a", "b"]);
}

#[test]
fn test_reopen_restores_local_files() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("x.txt");
    fs::write(&source, "x").unwrap();
    {
        let db = Database::create(temp.path(), "db1").unwrap();
        db.add_named("foo").unwrap();
        db.upload_files("foo", [source.to_str().unwrap()]).unwrap();
    }

    let db = Database::connect(temp.path(), "db1").unwrap();
    let entry = db.get("foo").unwrap();
    assert_eq!(entry.local_files(), ["x.txt"]);
    assert!(entry.remote_files().is_empty());
}

#[test]
fn test_colliding_attachment_is_rejected() {
    let temp = TempDir::new().unwrap();
    let db = Database::create(temp.path(), "db1").unwrap();
    db.add_named("alpha").unwrap();

    let first = temp.path().join("x.txt");
    fs::write(&first, "first").unwrap();
    db.upload_files("alpha", [first.to_str().unwrap()]).unwrap();

    fs::create_dir(temp.path().join("other")).unwrap();
    let second = temp.path().join("other").join("x.txt");
    fs::write(&second, "second").unwrap();
    let second = second.to_str().unwrap().to_string();

    let sync = db.upload_files("alpha", [second.clone()]).unwrap();
    assert!(sync.copied.is_empty());
    assert_eq!(sync.pending, vec![second.clone()]);
    assert_eq!(db.get("alpha").unwrap().remote_files(), [second]);
    assert_eq!(
        fs::read_to_string(temp.path().join("db1/alpha/x.txt")).unwrap(),
        "first"
    );
}

#[test]
fn test_rename_moves_folder_and_data_file() {
    let temp = TempDir::new().unwrap();
    let db = Database::create(temp.path(), "db1").unwrap();
    db.add_named("foo").unwrap();
    db.upload_line("foo", "kept").unwrap();

    db.rename("foo", "bar").unwrap();

    assert_eq!(db.get("bar").unwrap().data(), ["kept"]);
    assert!(db.get("foo").is_none());
    assert!(temp.path().join("db1/bar/bar.dat").is_file());
    assert!(!temp.path().join("db1/foo").exists());

    // edits keep working under the new name
    db.upload_line("bar", "more").unwrap();
    assert_eq!(
        read_lines(&temp.path().join("db1/bar/bar.dat")),
        vec!["kept", "more"]
    );
}

#[test]
fn test_rename_failures() {
    let temp = TempDir::new().unwrap();
    let db = Database::create(temp.path(), "db1").unwrap();
    db.add_named("foo").unwrap();
    db.add_named("bar").unwrap();

    assert!(matches!(
        db.rename("ghost", "baz"),
        Err(SimpleDbError::NotFound(_))
    ));
    assert!(matches!(
        db.rename("foo", "bar"),
        Err(SimpleDbError::AlreadyExists(_))
    ));
    assert!(matches!(
        db.rename("foo", "a/b"),
        Err(SimpleDbError::InvalidArgument(_))
    ));
    assert_eq!(db.entry_names(), vec!["foo", "bar"]);
}

#[test]
fn test_rename_onto_attachment_named_like_new_data_file() {
    let temp = TempDir::new().unwrap();
    let db = Database::create(temp.path(), "db1").unwrap();
    db.add_named("alpha").unwrap();
    db.upload_line("alpha", "data-line").unwrap();
    let source = temp.path().join("beta.dat");
    fs::write(&source, "USER ATTACHMENT").unwrap();
    db.upload_files("alpha", [source.to_str().unwrap()]).unwrap();

    assert!(matches!(
        db.rename("alpha", "beta"),
        Err(SimpleDbError::AlreadyExists(_))
    ));
    assert_eq!(db.entry_names(), vec!["alpha"]);
    assert_eq!(
        fs::read_to_string(temp.path().join("db1/alpha/beta.dat")).unwrap(),
        "USER ATTACHMENT"
    );

    let reopened = Database::connect(temp.path(), "db1").unwrap();
    let entry = reopened.get("alpha").unwrap();
    assert_eq!(entry.data(), ["data-line"]);
    assert_eq!(entry.local_files(), ["beta.dat"]);
}

#[test]
fn test_line_breaks_in_data_are_rejected() {
    let temp = TempDir::new().unwrap();
    let db = Database::create(temp.path(), "db1").unwrap();
    db.add_named("alpha").unwrap();

    assert!(matches!(
        db.upload_line("alpha", "one\ntwo"),
        Err(SimpleDbError::InvalidArgument(_))
    ));
    db.upload_line("alpha", "one").unwrap();

    let reopened = Database::connect(temp.path(), "db1").unwrap();
    assert_eq!(reopened.get("alpha").unwrap().data(), ["one"]);
}

#[test]
fn test_overlong_name_leaves_no_folder_behind() {
    let temp = TempDir::new().unwrap();
    let db = Database::create(temp.path(), "db1").unwrap();
    let name = "n".repeat(252);

    assert!(matches!(
        db.add_named(&name),
        Err(SimpleDbError::InvalidArgument(_))
    ));
    assert!(!temp.path().join("db1").join(&name).exists());

    let longest = "n".repeat(251);
    db.add_named(&longest).unwrap();
    assert!(temp
        .path()
        .join("db1")
        .join(&longest)
        .join(format!("{}.dat", longest))
        .is_file());

    let reopened = Database::connect(temp.path(), "db1").unwrap();
    assert_eq!(reopened.entry_names(), vec![longest]);
}

#[test]
fn test_delete_removes_entry_and_folder() {
    let temp = TempDir::new().unwrap();
    let db = Database::create(temp.path(), "db1").unwrap();
    db.add_named("alpha").unwrap();

    db.delete(" alpha ").unwrap();
    assert!(!db.contains("alpha"));
    assert!(!temp.path().join("db1/alpha").exists());
    assert!(matches!(
        db.delete("alpha"),
        Err(SimpleDbError::NotFound(_))
    ));
}

#[test]
fn test_scan_ignores_unrelated_folders() {
    let temp = TempDir::new().unwrap();
    Database::create(temp.path(), "db1").unwrap();
    fs::create_dir(temp.path().join("unrelated")).unwrap();

    assert_eq!(Database::scan(temp.path()).unwrap(), vec!["db1"]);
    assert!(matches!(
        Database::scan(temp.path().join("missing")),
        Err(SimpleDbError::NotFound(_))
    ));
}

#[test]
fn test_open_and_create_failures() {
    let temp = TempDir::new().unwrap();

    assert!(matches!(
        Database::connect(temp.path(), "db1"),
        Err(SimpleDbError::NotFound(_))
    ));
    Database::create(temp.path(), "db1").unwrap();
    assert!(matches!(
        Database::create(temp.path(), "db1"),
        Err(SimpleDbError::AlreadyExists(_))
    ));
    assert!(matches!(
        Database::create(temp.path(), "  "),
        Err(SimpleDbError::InvalidArgument(_))
    ));
}

#[test]
fn test_metadata_folder_is_never_an_entry() {
    let temp = TempDir::new().unwrap();
    let db = Database::create(temp.path(), "db1").unwrap();
    db.add_named("alpha").unwrap();
    assert!(db.add_named(".sddata").is_err());
    drop(db);

    let db = Database::connect(temp.path(), "db1").unwrap();
    assert_eq!(db.entry_names(), vec!["alpha"]);
}

#[test]
fn test_end_to_end_scenario() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("x.txt");
    fs::write(&source, b"attachment \x00\x01 bytes").unwrap();
    let source_str = source.to_str().unwrap().to_string();

    let db = Database::create(temp.path(), "db1").unwrap();
    db.add_named("alpha").unwrap();
    db.upload_line("alpha", "line1").unwrap();
    db.upload_files("alpha", [source_str.clone()]).unwrap();

    let root = temp.path().join("db1");
    assert_eq!(read_lines(&root.join("alpha/alpha.dat")), vec!["line1"]);
    assert_eq!(
        fs::read(root.join("alpha/x.txt")).unwrap(),
        fs::read(&source).unwrap()
    );

    let entry = db.get("alpha").unwrap();
    assert_eq!(entry.local_files(), ["x.txt"]);
    assert!(entry.remote_files().is_empty());

    assert_eq!(
        read_lines(&root.join(".sddata/log.dat")),
        vec![
            "new entry 'alpha'".to_string(),
            "edit data in 'alpha'".to_string(),
            "edit data in 'alpha'".to_string(),
            format!("file added to 'alpha' [{}]", source_str),
        ]
    );
}

#[test]
fn test_concurrent_edits_are_serialized() {
    let temp = TempDir::new().unwrap();
    let db = Database::create(temp.path(), "db1").unwrap();
    db.add_named("alpha").unwrap();

    std::thread::scope(|scope| {
        for t in 0..4 {
            let db = &db;
            scope.spawn(move || {
                for i in 0..25 {
                    db.upload_line("alpha", &format!("{}-{}", t, i)).unwrap();
                }
            });
        }
    });

    assert_eq!(db.get("alpha").unwrap().data_count(), 100);
    assert_eq!(
        read_lines(&temp.path().join("db1/alpha/alpha.dat")).len(),
        100
    );
}
