use proptest::prelude::*;
use sqlfs::{FsNode, Payload, SimplePayload};

use crate::integration::support::new_store;

#[test]
fn text_size_counts_utf16_units() {
    let (_temp, fs) = new_store();
    let f = fs.root().unwrap().add_file("t").unwrap();
    f.save_payload(&SimplePayload::text("añb")).unwrap();
    assert_eq!(f.size().unwrap(), 6);
    assert_eq!(
        fs.file("/t").unwrap().read_payload::<SimplePayload>().unwrap().as_text(),
        Some("añb")
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn saved_content_reads_back(bytes in proptest::collection::vec(any::<u8>(), 0..256), text in "\\PC{0,64}") {
        let (_temp, fs) = new_store();
        let root = fs.root().unwrap();

        let bin = root.add_file("bin").unwrap();
        let content = SimplePayload::binary(bytes.clone());
        bin.save_payload(&content).unwrap();
        prop_assert_eq!(bin.read_payload::<SimplePayload>().unwrap(), content.clone());
        prop_assert_eq!(bin.size().unwrap(), bytes.len() as u64);

        let txt = root.add_file("txt").unwrap();
        let content = SimplePayload::text(text.clone());
        txt.save_payload(&content).unwrap();
        prop_assert_eq!(txt.read_payload::<SimplePayload>().unwrap(), content.clone());
        prop_assert_eq!(txt.size().unwrap(), content.size_in_bytes());
    }
}
