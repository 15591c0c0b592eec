use std::{
    env,
    fs::File,
    io::{self, Read},
    path::Path,
    process,
};

use bnfgrammar::bnf::BnfGrammar;
use getopts::Options;
use slrtable::{from_bnf, TableOutput};
use tracing_subscriber::EnvFilter;

fn usage(prog: &str, msg: &str) -> ! {
    let path = Path::new(prog);
    let leaf = match path.file_name() {
        Some(m) => m.to_str().unwrap(),
        None => "slrgen",
    };
    if !msg.is_empty() {
        eprintln!("{}", msg);
    }
    eprintln!("Usage: {} [-d] [grammar-file]", leaf);
    process::exit(1);
}

fn read_file<P: AsRef<Path>>(path: P) -> String {
    let mut f = match File::open(&path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Can't open file {}: {}", path.as_ref().display(), e);
            process::exit(1);
        }
    };
    let mut s = String::new();
    if let Err(e) = f.read_to_string(&mut s) {
        eprintln!("Can't read file {}: {}", path.as_ref().display(), e);
        process::exit(1);
    }
    s
}

fn read_stdin() -> String {
    let mut s = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut s) {
        eprintln!("Can't read stdin: {}", e);
        process::exit(1);
    }
    s
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let prog = &args[0];
    let matches = match Options::new()
        .optflag("h", "help", "")
        .optflag("d", "dump-automaton", "Print the LR(0) automaton to stderr")
        .parse(&args[1..])
    {
        Ok(m) => m,
        Err(f) => usage(prog, f.to_string().as_str()),
    };

    if matches.opt_present("h") {
        usage(prog, "");
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let src = match matches.free.len() {
        0 => read_stdin(),
        1 => read_file(&matches.free[0]),
        _ => usage(prog, "Too many arguments given."),
    };

    tracing::debug!("parsing grammar ({} bytes)", src.len());
    let grm = match BnfGrammar::new(&src) {
        Ok(grm) => grm,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    tracing::debug!(
        "grammar has {} terminals, {} non-terminals, {} productions",
        grm.terminals_len(),
        grm.nonterminals_len(),
        usize::from(grm.prods_len())
    );

    let (sg, st) = match from_bnf(&grm) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    tracing::debug!(
        "automaton has {} states and {} edges",
        sg.all_states_len(),
        sg.all_edges_len()
    );
    if matches.opt_present("d") {
        eprint!("{}", sg.pp(&grm));
    }

    let out = TableOutput::new(&grm, &sg, &st);
    match serde_json::to_string(&out) {
        Ok(j) => println!("{}", j),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}
