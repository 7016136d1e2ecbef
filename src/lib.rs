use image::{self, DynamicImage, GenericImageView};
use itertools::iproduct;
use num_bigint::BigInt;
use num_derive::FromPrimitive;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};
use std::cmp::Reverse;
use std::collections::{HashSet, VecDeque};
use std::path::Path;

pub mod color;
pub mod config;
pub mod error;
pub mod io;

pub use color::{Color, NonStandardPolicy};
pub use config::Options;
pub use error::{ExecutionError, LoadError};
pub use io::{PietIo, StdIo};

/// Maximum number of consecutive failed exit attempts before a colored
/// block's traversal is abandoned.
const MAX_BOUNCE_ATTEMPTS: u8 = 8;

pub trait GetAllEqualIterator<T>: Iterator<Item = T> {
    fn get_all_equal(&mut self) -> Option<T>
    where
        Self: Sized,
        Self::Item: PartialEq,
    {
        let a = self.next()?;
        self.all(|x| a == x).then(|| a)
    }
}

impl<T, I: Iterator<Item = T>> GetAllEqualIterator<T> for I {}

type Coord = (usize, usize);

#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Noop = 0,
    Push = 1,
    Pop = 2,
    Add = 3,
    Subtract = 4,
    Multiply = 5,
    Divide = 6,
    Mod = 7,
    Not = 8,
    Greater = 9,
    Pointer = 10,
    Switch = 11,
    Duplicate = 12,
    Roll = 13,
    InNum = 14,
    InChar = 15,
    OutNum = 16,
    OutChar = 17,
}

/// A raster lifted to a grid of classified codels. Sampling happens once at
/// load time; traversal only ever reads it.
#[derive(Debug)]
pub struct PietCode {
    width: usize,
    height: usize,
    code: Vec<Color>,
    nonstandard: NonStandardPolicy,
}

impl PietCode {
    fn at(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.code[x + y * self.width])
    }

    /// Flood fill the 4-connected region of identically-colored codels
    /// containing `(x, y)`. Uses an explicit worklist rather than recursion
    /// so large uniform regions don't blow the call stack.
    fn region_at(&self, x: usize, y: usize) -> Option<CodelRegion> {
        let color = self.at(x, y)?;
        let mut seen = HashSet::new();
        seen.insert((x, y));
        let mut queue = VecDeque::new();
        queue.push_back((x, y));
        while let Some((x, y)) = queue.pop_front() {
            for (dx, dy) in [(0, 1), (1, 0), (0, usize::MAX), (usize::MAX, 0)] {
                let nx = x.wrapping_add(dx);
                let ny = y.wrapping_add(dy);
                if self.at(nx, ny).map_or(true, |n| n != color) {
                    continue;
                }
                if !seen.insert((nx, ny)) {
                    continue;
                }
                queue.push_back((nx, ny));
            }
        }
        Some(CodelRegion::new(seen, color))
    }

    pub fn execute(&self) -> PietRunner<'_, StdIo> {
        PietRunner::new(self, StdIo::new())
    }

    pub fn execute_with_io<IO: PietIo>(&self, io: IO) -> PietRunner<'_, IO> {
        PietRunner::new(self, io)
    }

    #[cfg(test)]
    pub(crate) fn from_colors(width: usize, height: usize, code: Vec<Color>) -> Self {
        assert_eq!(code.len(), width * height);
        PietCode { width, height, code, nonstandard: NonStandardPolicy::White }
    }

    #[cfg(test)]
    pub(crate) fn with_nonstandard(mut self, nonstandard: NonStandardPolicy) -> Self {
        self.nonstandard = nonstandard;
        self
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    fn to_delta(self) -> Coord {
        match self {
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (usize::MAX, 0),
            Direction::Up => (0, usize::MAX),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum CodelChoice {
    Left,
    Right,
}

pub(crate) struct CodelRegion {
    color: Color,
    region: HashSet<Coord>,
}

impl CodelRegion {
    fn new(region: HashSet<Coord>, color: Color) -> Self {
        CodelRegion { color, region }
    }

    fn value(&self) -> BigInt {
        BigInt::from(self.region.len())
    }

    /// The codel this region would exit to for the given direction pointer
    /// and codel chooser, one step beyond the region's boundary. May land
    /// out-of-bounds; callers check `PietCode::at` on the result.
    fn exit_to(&self, ip: InstructionPointer) -> Coord {
        let InstructionPointer(dp, cc) = ip;
        match (dp, cc) {
            (Direction::Right, CodelChoice::Left) => {
                let (x, y) = *self.region.iter().max_by_key(|(x, y)| (*x, Reverse(*y))).unwrap();
                (x + 1, y)
            }
            (Direction::Right, CodelChoice::Right) => {
                let (x, y) = *self.region.iter().max_by_key(|(x, y)| (*x, *y)).unwrap();
                (x + 1, y)
            }
            (Direction::Down, CodelChoice::Left) => {
                let (x, y) = *self.region.iter().max_by_key(|(x, y)| (*y, *x)).unwrap();
                (x, y + 1)
            }
            (Direction::Down, CodelChoice::Right) => {
                let (x, y) = *self.region.iter().max_by_key(|(x, y)| (*y, Reverse(*x))).unwrap();
                (x, y + 1)
            }
            (Direction::Left, CodelChoice::Left) => {
                let (x, y) = *self.region.iter().min_by_key(|(x, y)| (*x, Reverse(*y))).unwrap();
                (x.wrapping_sub(1), y)
            }
            (Direction::Left, CodelChoice::Right) => {
                let (x, y) = *self.region.iter().min_by_key(|(x, y)| (*x, *y)).unwrap();
                (x.wrapping_sub(1), y)
            }
            (Direction::Up, CodelChoice::Left) => {
                let (x, y) = *self.region.iter().min_by_key(|(x, y)| (*y, *x)).unwrap();
                (x, y.wrapping_sub(1))
            }
            (Direction::Up, CodelChoice::Right) => {
                let (x, y) = *self.region.iter().min_by_key(|(x, y)| (*y, Reverse(*x))).unwrap();
                (x, y.wrapping_sub(1))
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
struct InstructionPointer(Direction, CodelChoice);

impl InstructionPointer {
    fn flip(&mut self) {
        self.1 = match self.1 {
            CodelChoice::Left => CodelChoice::Right,
            CodelChoice::Right => CodelChoice::Left,
        }
    }

    fn rotate(&mut self) {
        self.0 = match self.0 {
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Right,
        };
    }
}

impl Default for InstructionPointer {
    fn default() -> Self {
        InstructionPointer(Direction::Right, CodelChoice::Left)
    }
}

/// The interpreter's traversal + stack state. Does not own the grid;
/// `step`/`run` take it by reference so one `PietVM` can be snapshotted or
/// replayed against different grids in tests.
pub struct PietVM {
    instruction_pointer: InstructionPointer,
    pos: Coord,
    stack: Vec<BigInt>,
    last_color: Option<Color>,
}

impl Default for PietVM {
    fn default() -> Self {
        PietVM {
            instruction_pointer: InstructionPointer::default(),
            pos: (0, 0),
            stack: Vec::new(),
            last_color: None,
        }
    }
}

impl PietVM {
    fn new() -> Self {
        Self::default()
    }

    pub fn stack(&self) -> &[BigInt] {
        &self.stack
    }

    /// Color of the block previously occupied, or `White` if the cursor's
    /// last move was a slide. `None` before the first completed step.
    pub fn last_color(&self) -> Option<Color> {
        self.last_color
    }

    /// Attempt to exit the colored region containing the cursor in the
    /// current (DP, CC) direction, retrying with the CC-then-DP toggle
    /// protocol up to `MAX_BOUNCE_ATTEMPTS` times. Returns the first
    /// non-black neighbor reached, whatever its color — the caller decides
    /// whether that's a slide entry or an opcode dispatch.
    fn bounce_to_exit(&mut self, code: &PietCode, region: &CodelRegion) -> Option<(Coord, Color)> {
        let mut toggled_this_bounce = false;
        for _ in 0..MAX_BOUNCE_ATTEMPTS {
            let coord = region.exit_to(self.instruction_pointer);
            if let Some(color) = code.at(coord.0, coord.1) {
                if !color.is_black(code.nonstandard) {
                    return Some((coord, color));
                }
            }
            if !toggled_this_bounce {
                self.instruction_pointer.flip();
                toggled_this_bounce = true;
            } else {
                self.instruction_pointer.rotate();
                toggled_this_bounce = false;
            }
        }
        None
    }

    /// Slide through white codels starting at `self.pos` in the current DP,
    /// toggling CC and rotating DP together on every obstruction.
    /// Cycle-detects on repeated `(position, DP)` pairs and returns `None`
    /// when trapped.
    fn walk_white(&mut self, code: &PietCode) -> Option<(Coord, Color)> {
        let mut seen = HashSet::new();
        while seen.insert((self.pos, self.instruction_pointer)) {
            let InstructionPointer(dir, _) = self.instruction_pointer;
            let (dx, dy) = dir.to_delta();
            loop {
                let (x, y) = self.pos;
                let nx = x.wrapping_add(dx);
                let ny = y.wrapping_add(dy);
                match code.at(nx, ny) {
                    None => break,
                    Some(c) if c.is_black(code.nonstandard) => break,
                    Some(c) if c.is_white(code.nonstandard) => {
                        self.pos = (nx, ny);
                    }
                    Some(c) => return Some(((nx, ny), c)),
                }
            }
            self.instruction_pointer.flip();
            self.instruction_pointer.rotate();
        }
        None
    }

    fn enter_slide(&mut self, code: &PietCode) -> bool {
        match self.walk_white(code) {
            Some((coord, _color)) => {
                log::debug!("white slide -> {coord:?}");
                self.pos = coord;
                self.last_color = Some(Color::White);
                true
            }
            None => {
                log::debug!("white slide cycle detected; terminating");
                false
            }
        }
    }

    fn pop1(&mut self) -> Result<BigInt, ExecutionError> {
        self.stack.pop().ok_or(ExecutionError::NotEnoughStack(1, 0))
    }

    fn pop2(&mut self) -> Result<(BigInt, BigInt), ExecutionError> {
        if self.stack.len() < 2 {
            return Err(ExecutionError::NotEnoughStack(2, self.stack.len()));
        }
        let top = self.stack.pop().unwrap();
        let below = self.stack.pop().unwrap();
        Ok((below, top))
    }

    fn last1(&self) -> Result<&BigInt, ExecutionError> {
        self.stack.last().ok_or(ExecutionError::NotEnoughStack(1, 0))
    }

    fn run_command(
        &mut self,
        command: Command,
        value: BigInt,
        io: &mut dyn PietIo,
    ) -> Result<(), ExecutionError> {
        match command {
            Command::Noop => {}
            Command::Push => self.stack.push(value),
            Command::Pop => {
                self.pop1()?;
            }
            Command::Add => {
                let (below, top) = self.pop2()?;
                self.stack.push(below + top);
            }
            Command::Subtract => {
                let (below, top) = self.pop2()?;
                self.stack.push(below - top);
            }
            Command::Multiply => {
                let (below, top) = self.pop2()?;
                self.stack.push(below * top);
            }
            Command::Divide => {
                // Operands are consumed even on divide-by-zero; only the push is skipped.
                let (below, top) = self.pop2()?;
                if top.is_zero() {
                    return Err(ExecutionError::DivisionByZero);
                }
                // Truncating division, not floor.
                self.stack.push(&below / &top);
            }
            Command::Mod => {
                let (below, top) = self.pop2()?;
                if top.is_zero() {
                    return Err(ExecutionError::DivisionByZero);
                }
                // Floor modulo: result takes the divisor's sign.
                self.stack.push(below.mod_floor(&top));
            }
            Command::Not => {
                let num = self.pop1()?;
                self.stack.push(if num.is_zero() { BigInt::from(1) } else { BigInt::zero() });
            }
            Command::Greater => {
                let (below, top) = self.pop2()?;
                self.stack.push(if below > top { BigInt::from(1) } else { BigInt::zero() });
            }
            Command::Pointer => {
                let spin = self.pop1()?;
                let spin = spin.mod_floor(&BigInt::from(4)).to_u8().unwrap();
                for _ in 0..spin {
                    self.instruction_pointer.rotate();
                }
            }
            Command::Switch => {
                let swap = self.pop1()?;
                if swap % 2 != BigInt::zero() {
                    self.instruction_pointer.flip();
                }
            }
            Command::Duplicate => {
                let top = self.last1()?.clone();
                self.stack.push(top);
            }
            Command::Roll => {
                // Pop rolls then depth unconditionally; depth<0, depth>len,
                // or depth==0 are no-ops after the pop.
                let (depth, rolls) = self.pop2()?;
                if depth < BigInt::zero() || depth > BigInt::from(self.stack.len()) {
                    return Ok(());
                }
                if depth.is_zero() {
                    return Ok(());
                }
                let depth = depth.to_usize().ok_or(ExecutionError::IntegerOverflow)?;
                let rolls = rolls.mod_floor(&BigInt::from(depth)).to_usize()
                    .ok_or(ExecutionError::IntegerOverflow)?;
                let start = self.stack.len() - depth;
                self.stack[start..].rotate_right(rolls);
            }
            Command::InNum => {
                if let Some(n) = read_number(io)? {
                    self.stack.push(n);
                }
            }
            Command::InChar => {
                if let Some(b) = io.read_byte()? {
                    self.stack.push(BigInt::from(b));
                }
            }
            Command::OutNum => {
                let num = self.pop1()?;
                io.write_number(&num.to_string())?;
            }
            Command::OutChar => {
                let num = self.pop1()?;
                let code_point = num.to_u32().ok_or_else(|| ExecutionError::EncodeError(num.clone()))?;
                let c = char::from_u32(code_point).ok_or(ExecutionError::EncodeError(num))?;
                io.write_char(c)?;
            }
        }
        Ok(())
    }

    /// Advance one step. Returns `false` when the program has terminated
    /// (bounce exhaustion, slide cycle, or an unreachable start).
    pub fn step(&mut self, code: &PietCode, io: &mut dyn PietIo) -> bool {
        let color = code.at(self.pos.0, self.pos.1)
            .expect("cursor must remain on an in-bounds codel");
        log::trace!("pos={:?} stack={:?}", self.pos, self.stack);

        if color.is_black(code.nonstandard) {
            log::debug!("cursor rests on black codel; terminating");
            return false;
        }
        if color.is_white(code.nonstandard) {
            return self.enter_slide(code);
        }

        let region = code.region_at(self.pos.0, self.pos.1)
            .expect("chromatic codel always has a region");
        let Some((coord, next_color)) = self.bounce_to_exit(code, &region) else {
            log::debug!("{MAX_BOUNCE_ATTEMPTS} consecutive failed moves; terminating");
            return false;
        };

        if next_color.is_white(code.nonstandard) {
            self.pos = coord;
            return self.enter_slide(code);
        }

        let command = region.color.step_to(next_color);
        let value = region.value();
        log::trace!("{:?} ({value}) -> {next_color:?} @ {coord:?} = {command:?}", region.color);
        if let Err(err) = self.run_command(command, value, io) {
            log::debug!("skipping {command:?}: {err}");
        }
        self.last_color = Some(region.color);
        self.pos = coord;
        true
    }
}

/// `in_number`: consume bytes until a non-digit or EOF, parse the digits
/// read (with an optional leading `-`), push. No digits read -> `Ok(None)`.
fn read_number(io: &mut dyn PietIo) -> Result<Option<BigInt>, ExecutionError> {
    let mut digits = String::new();
    loop {
        match io.read_byte()? {
            None => break,
            Some(b) => {
                let c = b as char;
                if digits.is_empty() && c == '-' {
                    digits.push(c);
                } else if c.is_ascii_digit() {
                    digits.push(c);
                } else {
                    break;
                }
            }
        }
    }
    if digits.is_empty() || digits == "-" {
        return Ok(None);
    }
    Ok(digits.parse::<BigInt>().ok())
}

pub struct PietRunner<'a, IO: PietIo> {
    code: &'a PietCode,
    vm: PietVM,
    io: IO,
}

impl<'a, IO: PietIo> PietRunner<'a, IO> {
    fn new(code: &'a PietCode, io: IO) -> Self {
        PietRunner { vm: PietVM::new(), code, io }
    }

    pub fn step(&mut self) -> bool {
        self.vm.step(self.code, &mut self.io)
    }

    pub fn run(&mut self) {
        while self.step() {}
    }

    pub fn stack(&self) -> &[BigInt] {
        self.vm.stack()
    }
}

/// Load a Piet program from an image file.
pub fn load(path: impl AsRef<Path>, options: &Options) -> Result<PietCode, LoadError> {
    if options.codel_size == 0 {
        return Err(LoadError::ZeroCodelSize);
    }
    let img = image::open(path)?;
    to_codels(img, options)
}

fn to_codels(img: DynamicImage, options: &Options) -> Result<PietCode, LoadError> {
    let (w, h) = img.dimensions();
    let codel_size = options.codel_size;
    if w % codel_size != 0 || h % codel_size != 0 {
        return Err(LoadError::BadDimensions { width: w, height: h, codel_size });
    }
    let width = w / codel_size;
    let height = h / codel_size;
    let img = img.into_rgb8();
    let code = iproduct!(0..height, 0..width)
        .map(|(y, x)| {
            img.view(x * codel_size, y * codel_size, codel_size, codel_size)
                .pixels()
                .map(|(_, _, px)| px)
                .get_all_equal()
                .map_or(Color::Other, |px| px.into())
        })
        .collect();
    Ok(PietCode { width: width as usize, height: height as usize, code, nonstandard: options.nonstandard })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::FakeIo;
    use assert_matches::assert_matches;

    fn to_stack(nums: &[i32]) -> Vec<BigInt> {
        nums.iter().map(|e| (*e).into()).collect()
    }

    fn grid(w: usize, h: usize, cells: &[(usize, usize, Color)]) -> PietCode {
        let mut code = vec![Color::Black; w * h];
        for &(x, y, c) in cells {
            code[x + y * w] = c;
        }
        PietCode::from_colors(w, h, code)
    }

    #[test]
    fn test_roll() {
        let mut vm = PietVM { stack: to_stack(&[4, 5, 6, 7, 8, 9, 3, 2]), ..Default::default() };
        let mut io = FakeIo::default();
        vm.run_command(Command::Roll, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.stack, to_stack(&[4, 5, 6, 8, 9, 7]));
    }

    #[test]
    fn test_roll_zero_depth_is_noop() {
        let mut vm = PietVM { stack: to_stack(&[1, 2, 3, 0, 5]), ..Default::default() };
        let mut io = FakeIo::default();
        vm.run_command(Command::Roll, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.stack, to_stack(&[1, 2, 3]));
    }

    #[test]
    fn test_roll_depth_exceeds_stack_is_noop() {
        let mut vm = PietVM { stack: to_stack(&[1, 2, 5, 1]), ..Default::default() };
        let mut io = FakeIo::default();
        vm.run_command(Command::Roll, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.stack, to_stack(&[1, 2]));
    }

    #[test]
    fn test_roll_inverse_restores_stack() {
        let mut vm = PietVM { stack: to_stack(&[1, 2, 3, 4, 5, 3, 2]), ..Default::default() };
        let mut io = FakeIo::default();
        vm.run_command(Command::Roll, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.stack, to_stack(&[1, 2, 4, 5, 3]));
        // Rolling back by -2 (mod depth 3) undoes the roll of 2.
        vm.stack.push(BigInt::from(3));
        vm.stack.push(BigInt::from(-2));
        vm.run_command(Command::Roll, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.stack, to_stack(&[1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_div_zero() {
        let mut vm = PietVM { stack: to_stack(&[4, 0]), ..Default::default() };
        let mut io = FakeIo::default();
        let result = vm.run_command(Command::Divide, BigInt::zero(), &mut io);
        assert_matches!(result, Err(ExecutionError::DivisionByZero));
        // Operands are consumed even though the instruction is skipped.
        assert!(vm.stack.is_empty());
    }

    #[test]
    fn test_div_zero_too_few() {
        let mut vm = PietVM { stack: to_stack(&[0]), ..Default::default() };
        let mut io = FakeIo::default();
        let result = vm.run_command(Command::Divide, BigInt::zero(), &mut io);
        assert_matches!(result, Err(ExecutionError::NotEnoughStack(2, 1)));
        assert_eq!(vm.stack, to_stack(&[0]));
    }

    #[test]
    fn test_divide_truncates_toward_zero() {
        let mut vm = PietVM { stack: to_stack(&[-7, 2]), ..Default::default() };
        let mut io = FakeIo::default();
        vm.run_command(Command::Divide, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.stack, to_stack(&[-3])); // trunc(-7/2) = -3, not floor (-4)
    }

    #[test]
    fn test_mod_zero() {
        let mut vm = PietVM { stack: to_stack(&[4, 0]), ..Default::default() };
        let mut io = FakeIo::default();
        let result = vm.run_command(Command::Mod, BigInt::zero(), &mut io);
        assert_matches!(result, Err(ExecutionError::DivisionByZero));
        assert!(vm.stack.is_empty());
    }

    #[test]
    fn test_mod_sign_follows_divisor() {
        let mut vm = PietVM { stack: to_stack(&[-7, 2]), ..Default::default() };
        let mut io = FakeIo::default();
        vm.run_command(Command::Mod, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.stack, to_stack(&[1])); // -7 mod 2 = 1 (floor modulo)
    }

    #[test]
    fn test_duplicate_then_pop_is_identity() {
        let mut vm = PietVM { stack: to_stack(&[1, 2, 3]), ..Default::default() };
        let mut io = FakeIo::default();
        let before = vm.stack.clone();
        vm.run_command(Command::Duplicate, BigInt::zero(), &mut io).unwrap();
        vm.run_command(Command::Pop, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.stack, before);
    }

    #[test]
    fn test_not_is_boolean() {
        let mut vm = PietVM { stack: to_stack(&[0]), ..Default::default() };
        let mut io = FakeIo::default();
        vm.run_command(Command::Not, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.stack, to_stack(&[1]));
        vm.run_command(Command::Not, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.stack, to_stack(&[0]));
    }

    #[test]
    fn test_pointer_rotates_dp() {
        let mut vm = PietVM { stack: to_stack(&[1]), ..Default::default() };
        assert_eq!(vm.instruction_pointer.0, Direction::Right);
        let mut io = FakeIo::default();
        vm.run_command(Command::Pointer, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.instruction_pointer.0, Direction::Down);
    }

    #[test]
    fn test_pointer_negative_normalizes() {
        let mut vm = PietVM { stack: to_stack(&[-1]), ..Default::default() };
        let mut io = FakeIo::default();
        vm.run_command(Command::Pointer, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.instruction_pointer.0, Direction::Up);
    }

    #[test]
    fn test_pointer_inverse_restores_dp() {
        let mut vm = PietVM { stack: to_stack(&[3]), ..Default::default() };
        let mut io = FakeIo::default();
        vm.run_command(Command::Pointer, BigInt::zero(), &mut io).unwrap();
        vm.stack.push(BigInt::from(-3));
        vm.run_command(Command::Pointer, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.instruction_pointer.0, Direction::Right);
    }

    #[test]
    fn test_switch_toggles_cc_on_odd() {
        let mut vm = PietVM { stack: to_stack(&[3]), ..Default::default() };
        assert_eq!(vm.instruction_pointer.1, CodelChoice::Left);
        let mut io = FakeIo::default();
        vm.run_command(Command::Switch, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.instruction_pointer.1, CodelChoice::Right);
    }

    #[test]
    fn test_in_number_parses_leading_digits() {
        let mut io = FakeIo::with_input(b"123abc");
        let n = read_number(&mut io).unwrap();
        assert_eq!(n, Some(BigInt::from(123)));
    }

    #[test]
    fn test_in_number_negative() {
        let mut io = FakeIo::with_input(b"-42,");
        let n = read_number(&mut io).unwrap();
        assert_eq!(n, Some(BigInt::from(-42)));
    }

    #[test]
    fn test_in_number_no_digits_is_skip() {
        let mut io = FakeIo::with_input(b"xyz");
        let n = read_number(&mut io).unwrap();
        assert_eq!(n, None);
    }

    #[test]
    fn test_in_number_eof_is_skip() {
        let mut io = FakeIo::with_input(b"");
        let n = read_number(&mut io).unwrap();
        assert_eq!(n, None);
    }

    #[test]
    fn test_in_char_reads_byte() {
        let mut vm = PietVM::default();
        let mut io = FakeIo::with_input(b"A");
        vm.run_command(Command::InChar, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.stack, to_stack(&[65]));
    }

    #[test]
    fn test_in_char_eof_is_skip() {
        let mut vm = PietVM::default();
        let mut io = FakeIo::with_input(b"");
        vm.run_command(Command::InChar, BigInt::zero(), &mut io).unwrap();
        assert!(vm.stack.is_empty());
    }

    #[test]
    fn test_out_char_writes_unicode_scalar() {
        let mut vm = PietVM { stack: to_stack(&[0x1F600]), ..Default::default() };
        let mut io = FakeIo::default();
        vm.run_command(Command::OutChar, BigInt::zero(), &mut io).unwrap();
        assert_eq!(io.output, "\u{1F600}");
    }

    #[test]
    fn test_out_number_writes_decimal() {
        let mut vm = PietVM { stack: to_stack(&[-7]), ..Default::default() };
        let mut io = FakeIo::default();
        vm.run_command(Command::OutNum, BigInt::zero(), &mut io).unwrap();
        assert_eq!(io.output, "-7");
    }

    /// Scenario 1: a 2-codel image `[red, dark red]` steps to push(1).
    #[test]
    fn scenario_hello_push() {
        let code = grid(2, 1, &[(0, 0, Color::Red), (1, 0, Color::DarkRed)]);
        let mut runner = code.execute_with_io(FakeIo::default());
        assert!(runner.step());
        assert_eq!(runner.stack(), &to_stack(&[1])[..]);
        assert_eq!(runner.vm.pos, (1, 0));
    }

    /// Scenario 3: an isolated colored codel surrounded by black bounces
    /// eight times then halts with an empty stack and no output.
    #[test]
    fn scenario_bounce_termination() {
        let code = grid(3, 3, &[(1, 1, Color::Red)]);
        let mut runner = code.execute_with_io(FakeIo::default());
        assert!(!runner.step());
        assert!(runner.stack().is_empty());
    }

    /// Scenario 4: exiting a colored block directly onto a run of white
    /// codels slides through them in one step and fires no opcode, even
    /// though the skipped transition (red -> dark red) would be `push`.
    #[test]
    fn scenario_white_slide_suppresses_opcode() {
        let code = grid(4, 1, &[
            (0, 0, Color::Red),
            (1, 0, Color::White),
            (2, 0, Color::White),
            (3, 0, Color::DarkRed),
        ]);
        let mut runner = code.execute_with_io(FakeIo::default());
        assert!(runner.step());
        assert!(runner.stack().is_empty());
        assert_eq!(runner.vm.pos, (3, 0));
        assert_eq!(runner.vm.last_color(), Some(Color::White));
    }

    /// Scenario 5: stack `[1,2,3,4,5]`, `roll` with `rolls=1, depth=3`
    /// buries the top element by one position within the top-3 slice.
    #[test]
    fn scenario_roll_buries_top() {
        let mut vm = PietVM { stack: to_stack(&[1, 2, 3, 4, 5]), ..Default::default() };
        let mut io = FakeIo::default();
        vm.stack.push(BigInt::from(3));
        vm.stack.push(BigInt::from(1));
        vm.run_command(Command::Roll, BigInt::zero(), &mut io).unwrap();
        assert_eq!(vm.stack, to_stack(&[1, 2, 5, 3, 4]));
    }

    /// A grid that is entirely white slides in a cycle and halts immediately.
    #[test]
    fn scenario_white_slide_cycle_terminates() {
        let code = PietCode::from_colors(3, 3, vec![Color::White; 9]);
        let mut runner = code.execute_with_io(FakeIo::default());
        assert!(!runner.step());
    }

    #[test]
    fn cursor_on_black_at_reset_terminates_immediately() {
        let code = grid(1, 1, &[(0, 0, Color::Black)]);
        let mut runner = code.execute_with_io(FakeIo::default());
        assert!(!runner.step());
        assert!(runner.stack().is_empty());
    }

    /// P4: flood fill is symmetric.
    #[test]
    fn block_resolution_is_symmetric() {
        let code = grid(3, 1, &[(0, 0, Color::Red), (1, 0, Color::Red), (2, 0, Color::DarkRed)]);
        let a = code.region_at(0, 0).unwrap();
        let b = code.region_at(1, 0).unwrap();
        assert_eq!(a.region, b.region);
        assert_eq!(a.region.len(), 2);
    }

    /// P5: EdgeCodel is deterministic for a given (region, DP, CC).
    #[test]
    fn edge_codel_is_deterministic() {
        let code = grid(3, 1, &[(0, 0, Color::Red), (1, 0, Color::Red), (2, 0, Color::DarkRed)]);
        let region = code.region_at(0, 0).unwrap();
        let ip = InstructionPointer(Direction::Right, CodelChoice::Left);
        assert_eq!(region.exit_to(ip), region.exit_to(ip));
    }

    #[test]
    fn nonstandard_black_blocks_movement() {
        let mut colors = vec![Color::Black; 3];
        colors[0] = Color::Red;
        colors[1] = Color::Other;
        let code = PietCode::from_colors(3, 1, colors).with_nonstandard(NonStandardPolicy::Black);
        let mut runner = code.execute_with_io(FakeIo::default());
        // Bounded bounce attempts still terminate even with Other folded into black.
        assert!(!runner.step());
    }

    #[test]
    fn nonstandard_white_slides_through() {
        let colors = vec![Color::Red, Color::Other, Color::DarkRed];
        let code = PietCode::from_colors(3, 1, colors).with_nonstandard(NonStandardPolicy::White);
        let mut runner = code.execute_with_io(FakeIo::default());
        assert!(runner.step());
        assert_eq!(runner.vm.pos, (2, 0));
        assert_eq!(runner.vm.last_color(), Some(Color::White));
    }
}
