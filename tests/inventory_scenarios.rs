use std::fs;

use book_inventory::{Book, BookPatch, Inventory, InventoryError};
use tempfile::TempDir;

fn dune() -> Book {
    Book::create("Dune", "Herbert", "1965", "SciFi", "111").unwrap()
}

fn emma() -> Book {
    Book::create("Emma", "Austen", "1815", "Novel", "222").unwrap()
}

#[test]
fn dune_lookup_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let mut inventory = Inventory::open(dir.path().join("inventario_libros.csv")).unwrap();
    assert!(inventory.is_empty());

    inventory.add(dune()).unwrap();

    assert_eq!(inventory.find_by_title("dune"), Some(&dune()));
    assert_eq!(inventory.list(), &[dune()]);
}

#[test]
fn second_add_with_same_isbn_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut inventory = Inventory::open(dir.path().join("inventario_libros.csv")).unwrap();
    inventory.add(dune()).unwrap();

    let other = Book::create("Other", "Someone", "2001", "Misc", "111").unwrap();
    let err = inventory.add(other).unwrap_err();

    assert!(matches!(err, InventoryError::DuplicateIsbn { .. }));
    assert_eq!(inventory.list(), &[dune()]);
    assert_eq!(Inventory::open(inventory.path()).unwrap().list(), &[dune()]);
}

#[test]
fn reload_reproduces_every_field() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("inventario_libros.csv");
    {
        let mut inventory = Inventory::open(&path).unwrap();
        inventory.add(dune()).unwrap();
        inventory.add(emma()).unwrap();
    }

    let reloaded = Inventory::open(&path).unwrap();
    assert_eq!(reloaded.list(), &[dune(), emma()]);
}

#[test]
fn every_mutation_rewrites_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("inventario_libros.csv");
    let mut inventory = Inventory::open(&path).unwrap();

    inventory.add(dune()).unwrap();
    inventory.add(emma()).unwrap();
    inventory
        .update("111", &BookPatch::default().genre("Fantasy"))
        .unwrap();
    inventory.remove_by_title("EMMA").unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "title,author,anio,genero,isbn\nDune,Herbert,1965,Fantasy,111\n"
    );

    inventory.remove_by_isbn("111").unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "title,author,anio,genero,isbn\n"
    );
}

#[test]
fn not_found_paths_leave_everything_unchanged() {
    let dir = TempDir::new().unwrap();
    let mut inventory = Inventory::open(dir.path().join("inventario_libros.csv")).unwrap();
    inventory.add(dune()).unwrap();

    assert!(inventory.find_by_isbn("404").is_none());
    assert!(inventory.find_by_title("Missing").is_none());
    for err in [
        inventory.remove_by_isbn("404").unwrap_err(),
        inventory.remove_by_title("Missing").unwrap_err(),
        inventory
            .update("404", &BookPatch::default().genre("x"))
            .unwrap_err(),
        inventory
            .update_by_title("Missing", &BookPatch::default().genre("x"))
            .unwrap_err(),
    ] {
        assert!(matches!(err, InventoryError::NotFound { .. }), "{err:?}");
    }
    assert_eq!(inventory.list(), &[dune()]);
}
