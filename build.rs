fn main() {
    // cfg.toml が無い場合は toml_cfg のデフォルト値で動作する（検証で弾かれる）
    println!("cargo:rerun-if-changed=cfg.toml");

    // ESP-IDF 向けビルドのときだけ ESP-IDF のビルド環境を引き継ぐ
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
