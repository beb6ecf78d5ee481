/*!
# Introductory Tutorial

Start the calculator with no arguments for an interactive session.
Type CTRL-D to leave. Every line you enter is evaluated and each result
is shown together with the variable that holds it.

<pre><code>&nbsp;> 2 + 3 * 4
&nbsp;  $1 = 14
&nbsp;> radius = 2.5
&nbsp;  radius = 2.5
&nbsp;> pi * radius * radius
&nbsp;  $2 = 19.634954084936208
</code></pre>

Results which are not assigned to anything land in temporary variables
named `$1`, `$2` and so on. Use them like any other variable. A result
you have already seen is not stored twice; it is shown again under the
name it already has.

<pre><code>&nbsp;> $1 / 2
&nbsp;  $3 = 7
&nbsp;> 14
&nbsp;  $1 = 14
</code></pre>

Several expressions go on one line when separated with `;`.

<pre><code>&nbsp;> a = 1; b = a + 1
&nbsp;  a = 1
&nbsp;  b = 2
</code></pre>

Numbers may carry units. They are converted to the default unit of
their category as soon as they are read, and shown with a prefix that
fits their size.

<pre><code>&nbsp;> 100cm + 1ft
&nbsp;  $4 = 1.3048m
&nbsp;> 0.005m
&nbsp;  $5 = 5mm
</code></pre>

Programs are kept as files named `<name>.calc` in the directory given
with `--programs`. Calling a program looks just like calling a function.
See [Chapter 2](../__Chapter_2/index.html).

<pre><code>&nbsp;> fib(10)
&nbsp;  $6 = 55
</code></pre>

Stop a running program with CTRL-C.

*/
