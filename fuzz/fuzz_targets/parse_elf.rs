#![no_main]
use libfuzzer_sys::fuzz_target;
use sectview::options::ParseOptions;

fuzz_target!(|data: &[u8]| {
    for opts in [ParseOptions::default(), ParseOptions::permissive()] {
        if let Ok(sections) = sectview::elf::Sections::parse_with_opts(data, &opts) {
            assert_eq!(sections.iter().len(), sections.table.count);
            for section in sections.iter() {
                let _ = section.name.len();
            }
        }
    }
});
