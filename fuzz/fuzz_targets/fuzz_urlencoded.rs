#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_tinyhttpd::urlencoded;

fuzz_target!(|data: &str| {
    // 壊れたエスケープを含むどんな入力でもパニックしない
    let params = urlencoded::parse(data);
    for (name, _value) in params.iter() {
        let _ = params.first(name);
        let _ = params.all(name);
    }

    // ターゲット分割も同様
    let (path, query) = urlencoded::split_target(data);
    let _ = path;
    if let Some(query) = query {
        let _ = urlencoded::parse(query);
    }
});
