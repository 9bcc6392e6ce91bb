
use std::env;
use std::path::Path;
use std::process;
use dmatrix::{Error, Parameters, ReadFile, Result, SparseMatrix, Wordmap};


// summary of one sparse density matrix from a finished run: dimension, trace, stored
// cells and the K largest cells, labelled with wordmap words when wordmap.txt exists.
//
// arguments: output dir, target word, K (optional, default 10)
// example: ... Output/ cat 20

fn main() {

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if let Err(e) = run(&args) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {

    if args.len() < 3 || args.len() > 4 {
        return Err(Error::config("arguments should be an output dir, a target word and optionally K"));
    }
    let output_dir = Path::new(&args[1]);
    let target = &args[2];
    let k = match args.get(3) {
        Some(k) => k.parse::<usize>().map_err(|_| Error::config(format!("K should be a number, got {}", k)))?,
        None => 10,
    };

    let params = Parameters::read_file(&output_dir.join("parameters.txt"))?;
    let matrix = SparseMatrix::read_file(&output_dir.join(format!("{}.bin", target)))?;
    let words = Wordmap::read_file(&output_dir.join("wordmap.txt")).ok();

    // validates every index against the dimension
    matrix.to_dense(params.dimension)?;

    println!("target: {}", target);
    println!("dimension: {}", params.dimension);
    if let Some(cutoff) = params.cutoff {
        println!("cutoff: {}", cutoff);
    }
    println!("stored cells: {}", matrix.len());
    println!("trace: {}", matrix.trace());

    let mut entries = matrix.into_entries();
    entries.sort_by(|a, b| b.value.total_cmp(&a.value));

    let label = |i: u32| match &words {
        Some(Wordmap(words)) => words.get(i as usize).cloned().unwrap_or_else(|| i.to_string()),
        None => i.to_string(),
    };
    for entry in entries.iter().take(k) {
        println!("{}\t{}\t{}", label(entry.x), label(entry.y), entry.value);
    }
    Ok(())
}
