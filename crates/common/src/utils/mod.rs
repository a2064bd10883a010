/// 工具函数集合

use std::collections::BTreeMap;

/// 解析属性字符串 `volume,key=value,...`
///
/// 第一个不含 `=` 的片段作为主值返回，其余按键值对收集
pub fn parse_property_string(value: &str) -> (Option<String>, BTreeMap<String, String>) {
    let mut main = None;
    let mut options = BTreeMap::new();

    for (idx, part) in value.split(',').enumerate() {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once('=') {
            Some((key, val)) => {
                options.insert(key.trim().to_string(), val.trim().to_string());
            }
            None if idx == 0 => main = Some(part.to_string()),
            None => {
                options.insert(part.to_string(), String::new());
            }
        }
    }

    (main, options)
}

/// 远程 API 的布尔参数使用 0/1
pub fn api_bool(value: bool) -> u8 {
    if value {
        1
    } else {
        0
    }
}
