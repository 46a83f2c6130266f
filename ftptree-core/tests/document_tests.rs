// Tests for tree document conversion and persistence

use ftptree_core::document::TreeDocument;
use ftptree_crawler::CrawlNode;

fn sized_tree() -> CrawlNode {
    let mut root = CrawlNode::root("/");
    let mut sub = CrawlNode::dir("sub", "/");
    sub.children
        .insert("b.txt".into(), CrawlNode::leaf("b.txt", "/sub", 50));
    root.children
        .insert("a.txt".into(), CrawlNode::leaf("a.txt", "/", 100));
    root.children.insert("sub".into(), sub);
    root.total_size();
    root
}

// ============================================================================
// Conversion
// ============================================================================

#[test]
fn test_document_from_aggregated_tree() {
    let tree = sized_tree();
    let doc = TreeDocument::from_tree(&tree, "2026-08-06").unwrap();

    assert_eq!(doc.date, "2026-08-06");
    assert_eq!(doc.root.size, 150);
    assert_eq!(doc.root.name, "/");
    assert_eq!(doc.root.path, "");
    assert_eq!(doc.root.children["a.txt"].size, 100);
    assert_eq!(doc.root.children["sub"].children["b.txt"].size, 50);
    assert_eq!(doc.root.children["sub"].children["b.txt"].path, "/sub");
}

#[test]
fn test_document_rejects_unresolved_sizes() {
    // A tree that was never aggregated still carries the sentinel.
    let mut root = CrawlNode::root("/");
    root.children
        .insert("sub".into(), CrawlNode::dir("sub", "/"));
    assert!(TreeDocument::from_tree(&root, "2026-08-06").is_err());
}

#[test]
fn test_every_document_node_has_a_size() {
    fn walk(node: &ftptree_core::DocNode, seen: &mut usize) {
        *seen += 1;
        for child in node.children.values() {
            walk(child, seen);
        }
    }
    let doc = TreeDocument::from_tree(&sized_tree(), "2026-08-06").unwrap();
    let mut seen = 0;
    walk(&doc.root, &mut seen);
    assert_eq!(seen, 4);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_write_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.json");

    let doc = TreeDocument::from_tree(&sized_tree(), "2026-08-06").unwrap();
    doc.write(&path).unwrap();

    let loaded = TreeDocument::load(&path).unwrap();
    assert_eq!(loaded, doc);
}

#[test]
fn test_names_keep_raw_bytes() {
    // A filename that arrived as non-UTF-8 bytes is carried as
    // Latin-1 chars and survives the JSON round trip.
    let raw_name: String = [0xC4u8, 0xE9, 0x2E, 0x64, 0x61, 0x74]
        .iter()
        .map(|&b| b as char)
        .collect();

    let mut root = CrawlNode::root("/");
    root.children
        .insert(raw_name.clone(), CrawlNode::leaf(raw_name.clone(), "/", 7));
    root.total_size();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.json");
    let doc = TreeDocument::from_tree(&root, "2026-08-06").unwrap();
    doc.write(&path).unwrap();

    let loaded = TreeDocument::load(&path).unwrap();
    let name = loaded.root.children.keys().next().unwrap();
    let bytes: Vec<u8> = name.chars().map(|c| c as u8).collect();
    assert_eq!(bytes, vec![0xC4, 0xE9, 0x2E, 0x64, 0x61, 0x74]);
}
