fn main() {
    if let Err(err) = sos_connect_lib::run() {
        eprintln!("sos-connect: {err:#}");
        std::process::exit(1);
    }
}
