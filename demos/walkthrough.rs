use clap::Parser;

use symast::engine::Engine;
use symast::op::Op;
use symast::proxy::IfProxy;
use symast::value::Leaf;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Width of the symbolic bit-vector.
    #[arg(value_name = "INT", default_value = "32")]
    width: u32,

    /// Number of low bits to extract and pivot through.
    #[clap(long, value_name = "INT", default_value = "8")]
    low: u32,

    /// Log every construction step.
    #[clap(long)]
    trace: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.trace {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Info
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let engine = Engine::default();
    println!("engine = {:?}", engine);

    // Constants fold eagerly.
    let hi = engine.bvv(5, 8)?;
    let lo = engine.bvv(3, 8)?;
    let joined = engine.concat(&[&hi, &lo])?;
    println!("concat(5, 3) = {}", joined);
    let field = engine.extract(15, 8, &engine.bvv(0x1234, 16)?)?;
    println!("extract(15, 8, 0x1234) = {}", field);

    // Symbols stay trees.
    let x = engine.bvs("x", args.width)?;
    let c = engine.bvs("c", args.low)?;
    let low = engine.extract(args.low - 1, 0, &x)?;
    println!("low = {}", low);
    println!("reverse(reverse(x)) == x: {}", engine.reverse(&engine.reverse(&x)?)? == x);

    // Negotiated operators.
    let bumped = engine.eval(&low + 1)?;
    println!("low + 1 = {}", bumped);
    let rel = engine.apply(Op::ULE, (&low).into(), (&c).into())?;
    println!("rel = {}", rel);
    print!("{}", engine.debug_string(rel.ast().ok_or_else(|| color_eyre::eyre::eyre!("rel folded"))?));

    // Solve the relation for x.
    let (Some(rel_ast), Some(x_ast)) = (rel.ast(), x.ast()) else {
        color_eyre::eyre::bail!("expected trees");
    };
    let solved = engine.pivot(rel_ast, Some(x_ast), None)?;
    println!("pivot on x: {}", solved);

    // Substitution.
    let y = engine.bvs("y", args.width)?;
    let (swapped, replaced) = rel.replace(&engine, &x, &y)?;
    println!("replace x by y ({}): {}", replaced, swapped);

    // Undecided conditions over intervals become conditional values.
    let small = engine.si(8, 1, 0, 5)?;
    let overlap = engine.si(8, 1, 3, 12)?;
    let cond = engine.apply(Op::ULT, (&small).into(), (&overlap).into())?;
    println!("cond = {}", cond);
    if let Some(cond_ast) = cond.ast() {
        let ite = engine.mk_ast(
            Op::If,
            vec![cond_ast.clone().into(), engine.si(8, 0, 1, 1)?.into(), engine.si(8, 0, 2, 2)?.into()],
        )?;
        let value = engine.resolve(&ite, None);
        println!("if cond then 1 else 2 = {}", value);
        if let Some(leaf) = value.as_leaf() {
            let (_, on_false) = IfProxy::unwrap(leaf, false);
            println!("false branch = {}", on_false);
            if let Leaf::Proxy(p) = leaf {
                println!("plus 10 = {}", p.apply_binary(Op::Add, &Leaf::bv(10, 8))?);
            }
        }
    }

    Ok(())
}
