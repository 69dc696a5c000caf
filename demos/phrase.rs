use spintax_lib::Spintax;
use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

/// Prints the number of combinations of the first line of a spintax file and a few
/// random sentences from it.
///
/// Usage: `phrase [FILE] [SAMPLES]`, defaulting to `phrase.txt` and 10.
fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| String::from("phrase.txt"));
    let samples = match args.next().map(|s| s.parse::<usize>()) {
        None => 10,
        Some(Ok(n)) => n,
        Some(Err(e)) => {
            eprintln!("invalid number of samples: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let spintax = match File::open(&path)
        .map_err(spintax_lib::Error::from)
        .and_then(|f| Spintax::from_reader(BufReader::new(f)))
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let count = if let Some(x) = spintax.count() {
        x.to_string()
    } else {
        String::from("> u64::MAX")
    };
    println!("Number of combinations = {}", count);

    let mut rng = rand::rng();
    for _ in 0..samples {
        println!("random sentence : {}", spintax.random(&mut rng));
    }
    ExitCode::SUCCESS
}
