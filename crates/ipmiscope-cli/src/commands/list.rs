use ipmiscope_core::all_collectors;

pub fn run() {
    let descriptors = super::make_descriptors();
    let collectors = all_collectors(&descriptors);

    println!("{} collector(s):\n", collectors.len());
    for c in &collectors {
        println!("  {:<16} {}", c.name(), c.info().description);
        println!("  {:<16} $ {}", "", c.command());
    }

    println!("\nMetrics:\n");
    for d in descriptors.all() {
        let labels = if d.label_names().is_empty() {
            String::new()
        } else {
            format!("{{{}}}", d.label_names().join(","))
        };
        println!("  {:<8} {}{labels}", d.kind(), d.fq_name());
    }
}
