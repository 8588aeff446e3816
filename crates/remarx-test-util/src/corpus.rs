use std::path::{Path, PathBuf};

/// Opening lines of Goethe's "Der Zauberlehrling", as `(sent_id, text)`.
pub const POEM_ORIGINAL: &[(&str, &str)] = &[
    (
        "A",
        "Hat der alte Hexenmeister Sich doch einmal wegbegeben!",
    ),
    (
        "B",
        "Und nun sollen seine Geister Auch nach meinem Willen leben.",
    ),
    (
        "C",
        "Seine Wort und Werke Merkt ich und den Brauch, Und mit Geistesstärke Tu ich Wunder auch.",
    ),
];

/// Reuse side for the poem fixture: `a` copies original `B`, `b` is unrelated.
pub const POEM_REUSE: &[(&str, &str)] = &[
    (
        "a",
        "Und nun sollen seine Geister Auch nach meinem Willen leben.",
    ),
    ("b", "Komm zurück zu mir"),
];

/// Write a sentence corpus CSV with `sent_id,file,text` columns.
///
/// Each row is `(sent_id, file, text)`. Returns the path of the created file.
pub fn write_corpus(dir: &Path, name: &str, rows: &[(&str, &str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let mut writer = csv::Writer::from_path(&path).unwrap();
    writer.write_record(["sent_id", "file", "text"]).unwrap();
    for (id, file, text) in rows {
        writer.write_record([*id, *file, *text]).unwrap();
    }
    writer.flush().unwrap();
    path
}

/// Write a corpus where every row shares the same source file name.
pub fn write_sentences(dir: &Path, name: &str, file: &str, rows: &[(&str, &str)]) -> PathBuf {
    let rows: Vec<(&str, &str, &str)> = rows.iter().map(|(id, text)| (*id, file, *text)).collect();
    write_corpus(dir, name, &rows)
}

/// Write arbitrary file content, for malformed-input tests.
pub fn write_raw(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_corpus_quotes_commas() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_corpus(tmp.path(), "c.csv", &[("a", "f.txt", "one, two")]);
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, "sent_id,file,text\na,f.txt,\"one, two\"\n");
    }
}
