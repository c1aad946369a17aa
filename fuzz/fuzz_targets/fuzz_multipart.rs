#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_tinyhttpd::multipart;

fuzz_target!(|data: &[u8]| {
    // 様々な Content-Type でパースを試行
    let content_types = [
        "multipart/form-data; boundary=boundary",
        "multipart/form-data; boundary=----WebKitFormBoundary",
        "multipart/form-data; boundary=---",
        "multipart/form-data; boundary=",
        "multipart/form-data",
    ];

    for content_type in content_types {
        // パニックしなければ OK
        if let Ok(parts) = multipart::parse(data, content_type) {
            for part in parts.iter() {
                let _ = part.name();
                let _ = part.filename();
                let _ = part.content_type();
                let _ = part.content();
                let _ = part.content_str();
                let _ = part.is_file();
                let _ = part.size();
            }
        }
    }
});
