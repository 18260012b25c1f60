use grid_particles::run;

fn main() -> anyhow::Result<()> {
    run()
}
