use ansi_term::Colour;
use std::io::Write;
use std::path::Path;

pub fn startup_lines(port: u16, root: &Path) -> [String; 4] {
    [
        Colour::Green
            .bold()
            .paint(format!("Starting server at http://localhost:{}", port))
            .to_string(),
        Colour::Yellow
            .bold()
            .paint("Press Ctrl+C to stop the server")
            .to_string(),
        Colour::Blue
            .bold()
            .paint(format!("Serving files from: {}", root.display()))
            .to_string(),
        Colour::Cyan
            .bold()
            .paint("No-cache headers enabled - browser will request fresh files on each reload")
            .to_string(),
    ]
}

pub fn shutdown_line() -> String {
    format!("\n{}", Colour::Red.bold().paint("Server stopped"))
}

pub fn print_startup(out: &mut impl Write, port: u16, root: &Path) -> std::io::Result<()> {
    for line in startup_lines(port, root) {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}

pub fn print_shutdown(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "{}", shutdown_line())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_banner_order_and_colours() {
        let mut out = Vec::new();
        print_startup(&mut out, 8000, Path::new("/srv/site")).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            vec![
                "\x1b[1;32mStarting server at http://localhost:8000\x1b[0m",
                "\x1b[1;33mPress Ctrl+C to stop the server\x1b[0m",
                "\x1b[1;34mServing files from: /srv/site\x1b[0m",
                "\x1b[1;36mNo-cache headers enabled - browser will request fresh files on each reload\x1b[0m",
            ]
        );
    }

    #[test]
    fn shutdown_is_bold_red_on_its_own_line() {
        let mut out = Vec::new();
        print_shutdown(&mut out).unwrap();
        assert_eq!(out, b"\n\x1b[1;31mServer stopped\x1b[0m\n");
    }
}
