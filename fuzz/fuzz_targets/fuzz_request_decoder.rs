#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_tinyhttpd::RequestDecoder;

fuzz_target!(|data: &[u8]| {
    // 一括投入と EOF 確定の両方を試す
    let mut decoder = RequestDecoder::new();
    if decoder.feed(data).is_ok() {
        let decoded = decoder.decode();
        let finished = decoder.finish();

        // パニックしなければ OK。完成したらアクセサも叩く
        for request in [decoded, finished].into_iter().flatten().flatten() {
            let _ = request.method();
            let _ = request.full_path();
            let _ = request.path();
            let _ = request.version();
            let _ = request.header("Content-Type");
            let _ = request.content_length();
            let _ = request.body_str();
            let _ = request.all_query_params();
            let _ = request.all_post_params();
            let _ = request.all_form_parts();
            let _ = request.warnings();
        }
    }
});
