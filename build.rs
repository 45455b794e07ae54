fn main() {
    // Propagate the ESP-IDF build environment (linker args, sdkconfig)
    // only when building the board image.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
