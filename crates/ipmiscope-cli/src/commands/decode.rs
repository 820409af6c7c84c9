use ipmiscope_core::{
    RawResult, Target, collectors_by_name, decode_raw_octets, lookup_name, metric_stream,
};

pub fn run(collector: &str, raw: &[String]) {
    let descriptors = super::make_descriptors();
    let Some(collector) = lookup_name(collector.trim())
        .and_then(|name| collectors_by_name(&[name], &descriptors).into_iter().next())
    else {
        eprintln!("Unknown collector '{collector}'. Run `ipmiscope list`.");
        std::process::exit(1);
    };

    let raw = RawResult::new(raw.join(" "));
    let octets = match decode_raw_octets(&raw) {
        Ok(octets) => octets,
        Err(e) => {
            eprintln!("decode error: {e}");
            std::process::exit(1);
        }
    };
    println!("{} octet(s): {octets}", octets.len());

    let (sink, stream) = metric_stream();
    match collector.collect(&octets, &sink, &Target::local()) {
        Ok(n) => {
            println!("{}: {n} sample(s)", collector.name());
            for sample in stream.drain() {
                let labels: Vec<String> = sample
                    .labels()
                    .map(|(k, v)| format!("{k}=\"{v}\""))
                    .collect();
                if labels.is_empty() {
                    println!("  {} {}", sample.fq_name(), sample.value());
                } else {
                    println!("  {}{{{}}} {}", sample.fq_name(), labels.join(","), sample.value());
                }
            }
        }
        Err(e) => {
            eprintln!("{} error: {e}", e.kind());
            std::process::exit(1);
        }
    }
}
